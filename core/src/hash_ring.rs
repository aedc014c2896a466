use std::hash::Hasher;

use ahash::AHasher;

use crate::ring::HostGroupRing;

/// Fixed hasher seed keys. Using `ahash` with compile-time-constant keys
/// (rather than its default per-process-random keys) gives a 64-bit hash
/// that is fast, well-distributed, and deterministic across process
/// restarts for a fixed configuration. See DESIGN.md for the rationale.
const HASH_KEY_0: u64 = 0x5bd1_e995_7b7a_ed9d;
const HASH_KEY_1: u64 = 0x2545_f491_4f6c_dd1d;

/// Virtual nodes materialized per unit of host weight. A host with weight
/// 2.0 gets roughly twice the virtual nodes of a host with weight 1.0, and
/// therefore roughly twice the share of the hash space.
const VNODES_PER_UNIT_WEIGHT: u32 = 128;

/// Hard cap on virtual nodes for a single host, regardless of weight, so a
/// misconfigured extreme weight can't blow up ring construction.
const MAX_VNODES_PER_HOST: u32 = 8192;

fn hash_seed(seed: &str, vnode: u32) -> u64 {
    let mut hasher = AHasher::new_with_keys(HASH_KEY_0, HASH_KEY_1);
    hasher.write(seed.as_bytes());
    hasher.write_u32(vnode);
    hasher.finish()
}

/// Hashes an arbitrary byte string with the same fixed-key hasher the ring
/// uses for its virtual nodes, so that a fingerprint derived from a request
/// lands in the same hash space as the hosts it's compared against.
pub(crate) fn fingerprint_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = AHasher::new_with_keys(HASH_KEY_0, HASH_KEY_1);
    hasher.write(bytes);
    hasher.finish()
}

/// A weighted consistent-hash ring over the hosts of one [`HostGroupRing`].
///
/// Built once at configuration load and never mutated afterward; lookups
/// are read-only and safe for unbounded concurrent readers.
#[derive(Clone, Debug)]
pub struct ConsistentHashSelector {
    /// Sorted by `(hash, host_index)` so ties between virtual nodes on the
    /// same hash value break deterministically by host index.
    nodes: Vec<(u64, u32)>,
    num_hosts: usize,
}

impl ConsistentHashSelector {
    pub fn build(ring: &HostGroupRing) -> Self {
        let mut nodes = Vec::new();
        for host in ring.iter() {
            let vnode_count =
                ((host.weight() * VNODES_PER_UNIT_WEIGHT as f64).round() as u32)
                    .clamp(1, MAX_VNODES_PER_HOST);
            for v in 0..vnode_count {
                let h = hash_seed(host.hash_seed(), v);
                nodes.push((h, host.host_index()));
            }
        }
        nodes.sort_unstable();
        Self {
            nodes,
            num_hosts: ring.len(),
        }
    }

    /// Index into `nodes` of the first virtual node with hash ≥ `fingerprint`,
    /// wrapping to 0 if `fingerprint` is past every node.
    fn position(&self, fingerprint: u64) -> usize {
        match self.nodes.binary_search_by(|(h, _)| h.cmp(&fingerprint)) {
            Ok(i) | Err(i) => {
                if i >= self.nodes.len() {
                    0
                } else {
                    i
                }
            }
        }
    }

    /// The host whose virtual node is the smallest hash ≥ `fingerprint`,
    /// wrapping around the ring.
    pub fn first(&self, fingerprint: u64) -> u32 {
        let i = self.position(fingerprint);
        self.nodes[i].1
    }

    /// The next host in ring order, starting from `fingerprint`'s position,
    /// whose index is not in `skip`. `None` if every host has been skipped.
    pub fn next(&self, fingerprint: u64, skip: &[bool]) -> Option<u32> {
        debug_assert_eq!(skip.len(), self.num_hosts);
        if skip.iter().all(|&s| s) {
            return None;
        }
        let start = self.position(fingerprint);
        let len = self.nodes.len();
        for offset in 0..len {
            let (_, host_index) = self.nodes[(start + offset) % len];
            if !skip[host_index as usize] {
                return Some(host_index);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostRecord, Protocol, Scheme};

    fn ring(weights: &[f64]) -> HostGroupRing {
        let hosts = weights
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                HostRecord::new(
                    format!("host-{i}"),
                    vec![Protocol::new(Scheme::Http, 80)],
                    w,
                    None,
                    0,
                    i as u32,
                )
            })
            .collect();
        HostGroupRing::new(hosts)
    }

    #[test]
    fn first_is_deterministic() {
        let r = ring(&[1.0, 1.0, 1.0]);
        let sel = ConsistentHashSelector::build(&r);
        let a = sel.first(0xdead_beef);
        let b = sel.first(0xdead_beef);
        assert_eq!(a, b);
    }

    #[test]
    fn first_wraps_around() {
        let r = ring(&[1.0, 1.0]);
        let sel = ConsistentHashSelector::build(&r);
        // u64::MAX is past every finite hash unless one lands exactly there;
        // either way `first` must return a valid host index, never panic.
        let host = sel.first(u64::MAX);
        assert!((host as usize) < r.len());
    }

    #[test]
    fn next_skips_marked_hosts() {
        let r = ring(&[1.0, 1.0, 1.0]);
        let sel = ConsistentHashSelector::build(&r);
        let first = sel.first(42);
        let mut skip = vec![false; 3];
        skip[first as usize] = true;
        let second = sel.next(42, &skip).expect("one host remains unskipped twice over");
        assert_ne!(first, second);
    }

    #[test]
    fn next_returns_none_when_all_skipped() {
        let r = ring(&[1.0, 1.0]);
        let sel = ConsistentHashSelector::build(&r);
        assert_eq!(sel.next(7, &[true, true]), None);
    }

    #[test]
    fn heavier_host_gets_more_virtual_nodes() {
        let r = ring(&[1.0, 4.0]);
        let sel = ConsistentHashSelector::build(&r);
        let heavy_count = sel.nodes.iter().filter(|(_, h)| *h == 1).count();
        let light_count = sel.nodes.iter().filter(|(_, h)| *h == 0).count();
        assert!(heavy_count > light_count * 3);
    }
}
