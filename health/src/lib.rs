#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! A reference, in-process implementation of [`parent_selector_core::HealthView`].
//!
//! Grounded on the way `policy-controller` guards its shared index behind a
//! [`parking_lot`] lock: here the "index" is flattened to a plain map from a
//! host's `(group_index, host_index)` key to its current down-state. This is
//! the "thin default implementation behind the interface" the core's design
//! notes call for — swap it for a real active/passive probing subsystem
//! without touching anything in `parent-selector-core`.

use ahash::AHashMap;
use parking_lot::RwLock;
use parent_selector_core::{DownReason, HealthView, HostRecord};

#[derive(Debug)]
pub struct InMemoryHealthStore {
    down: RwLock<AHashMap<(u32, u32), DownReason>>,
}

impl InMemoryHealthStore {
    pub fn new() -> Self {
        Self {
            down: RwLock::new(AHashMap::default()),
        }
    }

    /// The reason a host is currently down, or `None` if it's up (or
    /// unknown — an unrecognized key is treated as available). Not part of
    /// the core-facing `HealthView` trait; used by diagnostics and tests.
    pub fn reason(&self, host: &HostRecord) -> Option<DownReason> {
        self.down.read().get(&host.key()).copied()
    }

    pub fn down_count(&self) -> usize {
        self.down.read().len()
    }
}

impl Default for InMemoryHealthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthView for InMemoryHealthStore {
    fn is_available(&self, host: &HostRecord) -> bool {
        !self.down.read().contains_key(&host.key())
    }

    fn mark_down(&self, host: &HostRecord, reason: DownReason) {
        let mut down = self.down.write();
        let entry = down.entry(host.key()).or_insert(reason);
        *entry = reason;
        tracing::debug!(host = host.hostname(), ?reason, "marked parent down");
    }

    fn mark_up(&self, host: &HostRecord) {
        if self.down.write().remove(&host.key()).is_some() {
            tracing::debug!(host = host.hostname(), "marked parent up");
        }
    }
}
