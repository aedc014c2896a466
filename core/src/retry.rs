use crate::resp_codes::ResponseCodeSet;

/// `code_is_failure(code)` ≡ `code ∈ resp_codes`. A thin, named wrapper
/// around [`ResponseCodeSet::contains`] so call sites read declaratively.
pub fn code_is_failure(resp_codes: &ResponseCodeSet, code: u16) -> bool {
    resp_codes.contains(code)
}

/// Whether another attempt is warranted for `code`, given how many attempts
/// have already been made.
///
/// `response_is_retryable(attempts, code)` ≡
/// `code_is_failure(code) ∧ attempts ≤ max_simple_retries ∧ attempts < num_parents`,
/// where `attempts` is the number of picks already made. The bound is
/// inclusive of `max_simple_retries` so that exactly `max_simple_retries + 1`
/// total attempts are made (the initial attempt plus `max_simple_retries`
/// retries) — matching the worked example in the scenario suite and the
/// `Bounded attempts` property, both of which size the cap at
/// `max_simple_retries + 1`, not `max_simple_retries`.
pub fn response_is_retryable(
    resp_codes: &ResponseCodeSet,
    attempts: u32,
    code: u16,
    max_simple_retries: u32,
    num_parents: u32,
) -> bool {
    code_is_failure(resp_codes, code) && attempts <= max_simple_retries && attempts < num_parents
}

/// `on_failure_mark_parent_down(code)` ≡ `500 ≤ code ≤ 599`. The
/// connection-failure sentinel is handled separately by the caller (it
/// always marks down; see [`crate::strategy::SelectionStrategy::mark`]).
pub fn on_failure_mark_parent_down(code: u16) -> bool {
    (500..=599).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resp_codes::STATUS_CONNECTION_FAILURE;

    #[test]
    fn mark_down_trigger_matches_5xx_range_exactly() {
        for code in 0u16..=999 {
            assert_eq!(on_failure_mark_parent_down(code), (500..=599).contains(&code));
        }
    }

    #[test]
    fn retry_respects_both_budgets() {
        let codes = ResponseCodeSet::new([503]);
        assert!(response_is_retryable(&codes, 0, 503, 5, 10));
        assert!(response_is_retryable(&codes, 5, 503, 5, 10), "attempts == max_simple_retries still retries once more");
        assert!(!response_is_retryable(&codes, 6, 503, 5, 10), "max_simple_retries budget spent");
        assert!(!response_is_retryable(&codes, 5, 503, 10, 5), "num_parents exhausted");
    }

    #[test]
    fn non_failure_code_never_retryable() {
        let codes = ResponseCodeSet::new([503]);
        assert!(!response_is_retryable(&codes, 0, 200, 5, 5));
        assert!(!response_is_retryable(&codes, 0, 400, 5, 5));
    }

    #[test]
    fn connection_failure_sentinel_counts_as_failure() {
        let codes = ResponseCodeSet::default();
        assert!(code_is_failure(&codes, STATUS_CONNECTION_FAILURE));
    }
}
