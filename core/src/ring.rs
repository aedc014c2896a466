use crate::host::HostRecord;

/// An ordered, non-empty sequence of [`HostRecord`]s at one tier of the
/// failover hierarchy.
///
/// This is both the linear backing store the strategy iterates for
/// `exhaust_ring` bookkeeping and the input the [consistent-hash
/// selector](crate::hash_ring::ConsistentHashSelector) is built from. Equal
/// weighting across records is not assumed.
#[derive(Clone, Debug)]
pub struct HostGroupRing {
    hosts: Vec<HostRecord>,
}

impl HostGroupRing {
    /// Builds a ring from the hosts belonging to one group, in load order.
    /// Panics if `hosts` is empty — groups are validated non-empty before
    /// this point (see `parent-selector-config`).
    pub fn new(hosts: Vec<HostRecord>) -> Self {
        assert!(!hosts.is_empty(), "a host group ring must be non-empty");
        Self { hosts }
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn at(&self, host_index: u32) -> &HostRecord {
        &self.hosts[host_index as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostRecord> {
        self.hosts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Protocol, Scheme};

    fn host(i: u32) -> HostRecord {
        HostRecord::new(
            format!("host-{i}"),
            vec![Protocol::new(Scheme::Http, 80)],
            1.0,
            None,
            0,
            i,
        )
    }

    #[test]
    fn iteration_matches_load_order() {
        let ring = HostGroupRing::new(vec![host(0), host(1), host(2)]);
        let names: Vec<_> = ring.iter().map(HostRecord::hostname).collect();
        assert_eq!(names, vec!["host-0", "host-1", "host-2"]);
    }

    #[test]
    #[should_panic(expected = "non-empty")]
    fn rejects_empty_ring() {
        let _ = HostGroupRing::new(vec![]);
    }
}
