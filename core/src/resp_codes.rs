/// Sentinel status reported by the proxy when a connection to a parent could
/// not be established at all (no HTTP response was ever read). Distinct from
/// any real HTTP status code.
pub const STATUS_CONNECTION_FAILURE: u16 = 900;

/// A sorted, deduplicated set of HTTP status codes (and the connection-
/// failure sentinel) classified as "failure for retry purposes".
///
/// [`STATUS_CONNECTION_FAILURE`] is always a member, regardless of what the
/// configuration document specified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseCodeSet {
    codes: Vec<u16>,
}

impl ResponseCodeSet {
    /// Builds a set from an arbitrary (possibly unsorted, possibly
    /// duplicate-containing) list of codes. Values outside `(300, 599)`
    /// (exclusive of both bounds) are silently dropped — callers that need
    /// to warn about dropped codes should validate before calling this (see
    /// `parent-selector-config`).
    pub fn new(codes: impl IntoIterator<Item = u16>) -> Self {
        let mut codes: Vec<u16> = codes
            .into_iter()
            .filter(|c| (301..=598).contains(c))
            .collect();
        codes.push(STATUS_CONNECTION_FAILURE);
        codes.sort_unstable();
        codes.dedup();
        Self { codes }
    }

    /// `code_is_failure(c)` ≡ `c ∈ resp_codes`.
    pub fn contains(&self, code: u16) -> bool {
        self.codes.binary_search(&code).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.codes.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        false // STATUS_CONNECTION_FAILURE is always present
    }
}

impl Default for ResponseCodeSet {
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_contains_connection_failure_sentinel() {
        let set = ResponseCodeSet::new([503]);
        assert!(set.contains(STATUS_CONNECTION_FAILURE));
    }

    #[test]
    fn drops_out_of_range_codes() {
        let set = ResponseCodeSet::new([200, 299, 300, 503, 600, 42]);
        assert!(!set.contains(200));
        assert!(!set.contains(299));
        assert!(!set.contains(300));
        assert!(set.contains(503));
        assert!(!set.contains(600));
        assert!(!set.contains(42));
    }

    #[test]
    fn dedups_and_sorts() {
        let set = ResponseCodeSet::new([503, 500, 503, 500]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![500, 503, STATUS_CONNECTION_FAILURE]);
    }

    #[test]
    fn empty_input_still_has_sentinel() {
        let set = ResponseCodeSet::default();
        assert_eq!(set.len(), 1);
        assert!(set.contains(STATUS_CONNECTION_FAILURE));
    }
}
