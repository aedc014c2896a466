use crate::host::HostRecord;

/// Why a host was marked down (or, for [`DownReason::Manual`], why an
/// operator forced it down out of band).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DownReason {
    ActiveProbe,
    Passive5xx,
    ConnectFail,
    SelfDetect,
    Manual,
}

/// A read-mostly projection of an externally-owned, process-wide host
/// status table.
///
/// The core never mutates health state directly — it only calls these three
/// entry points, and never blocks on them. Implementors own their own
/// synchronization; the core places no ordering requirement beyond eventual
/// visibility (a `mark_down` from one transaction need not be visible to an
/// `is_available` call from another transaction racing it).
pub trait HealthView {
    /// Whether `host` may currently be selected. Returns `true` unless the
    /// store has an explicit down entry for it.
    fn is_available(&self, host: &HostRecord) -> bool;

    /// Report that `host` should be considered down, for `reason`. Idempotent
    /// and best-effort: implementations may throttle or coalesce repeated
    /// calls, and callers must not assume the next `is_available` reflects
    /// this call immediately.
    fn mark_down(&self, host: &HostRecord, reason: DownReason);

    /// Report that `host` should be considered available again. Idempotent.
    fn mark_up(&self, host: &HostRecord);
}

impl<T: HealthView + ?Sized> HealthView for &T {
    fn is_available(&self, host: &HostRecord) -> bool {
        (**self).is_available(host)
    }

    fn mark_down(&self, host: &HostRecord, reason: DownReason) {
        (**self).mark_down(host, reason)
    }

    fn mark_up(&self, host: &HostRecord) {
        (**self).mark_up(host)
    }
}
