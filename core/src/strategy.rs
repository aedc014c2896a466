use thiserror::Error;

use crate::error::ConfigRejected;
use crate::hash_ring::{fingerprint_bytes, ConsistentHashSelector};
use crate::health::{DownReason, HealthView};
use crate::host::{HostRecord, Scheme};
use crate::request::RequestContext;
use crate::resp_codes::{ResponseCodeSet, STATUS_CONNECTION_FAILURE};
use crate::retry::{code_is_failure, on_failure_mark_parent_down, response_is_retryable};
use crate::ring::HostGroupRing;
use crate::MAX_GROUP_RINGS;

/// How the strategy moves between host-group rings across retry attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingMode {
    /// Fully exhaust available hosts within the current group before
    /// advancing to the next. Group index is non-decreasing across attempts.
    ExhaustRing,
    /// Round-robin across groups: attempt N targets group `N mod groups`,
    /// wrapping, selecting within that group via the consistent-hash ring.
    AlternateRing,
}

/// Which health-checking mechanisms this strategy honors. The core itself
/// never schedules probes; these flags are reported to (and interpreted by)
/// the external health subsystem.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HealthChecks {
    pub active: bool,
    pub passive: bool,
}

/// The static, load-time configuration of a [`SelectionStrategy`] — every
/// field that comes straight from the declarative document, as opposed to
/// the host-group rings themselves.
#[derive(Clone, Debug)]
pub struct StrategyConfig {
    pub name: String,
    pub scheme: Scheme,
    pub go_direct: bool,
    pub parent_is_proxy: bool,
    pub ignore_self_detect: bool,
    pub ring_mode: RingMode,
    pub max_simple_retries: u32,
    pub resp_codes: ResponseCodeSet,
    pub health_checks: HealthChecks,
}

/// The outcome of one attempt against a previously-selected parent, as
/// reported back to the strategy by the proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A response was read; `status` is its HTTP status code.
    Connected { status: u16 },
    /// No response was ever read — the connection itself failed.
    ConnectFailure,
}

impl Outcome {
    fn status_code(self) -> u16 {
        match self {
            Outcome::Connected { status } => status,
            Outcome::ConnectFailure => STATUS_CONNECTION_FAILURE,
        }
    }
}

/// What the proxy should do next after consulting [`SelectionStrategy::should_retry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Call `find_next_hop` again.
    Retry,
    /// Retries are exhausted but `go_direct` is set: bypass all parents and
    /// contact origin directly.
    GoDirect,
    /// Retries are exhausted and there's no bypass: surface the failure.
    Fail,
}

/// Returned from `find_next_hop` when no parent can currently be offered —
/// either the transaction's retry budget is spent, or every remaining host
/// is unavailable. The caller decides whether to bypass to origin (per
/// `go_direct`) or fail, based on [`StrategyConfig::go_direct`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("no parent available")]
pub struct NoParentAvailable;

/// A parent picked for one attempt, and enough context for the proxy to
/// both connect to it and to report the outcome back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentResult {
    pub hostname: String,
    pub port: u16,
    pub scheme: Scheme,
    pub is_retry: bool,
    pub attempt: u32,
}

/// Per-transaction retry state. Owned exclusively by the transaction driving
/// it; never shared across transactions, never touched by the strategy
/// outside of the calls the transaction makes.
#[derive(Clone, Debug)]
pub struct Scratchpad {
    attempts: u32,
    current_group: u32,
    last_group: u32,
    last_host: u32,
    /// `visited[group][host_index]` — hosts already returned to the caller,
    /// or scanned and found unavailable, within this transaction. Either way
    /// they're never offered again.
    visited: Vec<Vec<bool>>,
    fingerprint: Option<u64>,
}

impl Scratchpad {
    /// Creates a fresh scratchpad sized for `strategy`'s rings. Call once
    /// per transaction, on (or before) its first `find_next_hop`.
    pub fn new(strategy: &SelectionStrategy) -> Self {
        Self {
            attempts: 0,
            current_group: 0,
            last_group: 0,
            last_host: 0,
            visited: strategy.groups.iter().map(|g| vec![false; g.len()]).collect(),
            fingerprint: None,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// The root object of a named selection policy: its load-time configuration
/// plus the host-group rings and the consistent-hash selector built over
/// each one.
///
/// Immutable after construction — safe for unbounded concurrent reads. A new
/// configuration generation is built separately and swapped in wholesale by
/// the embedding proxy (e.g. via `Arc<SelectionStrategy>` / `ArcSwap`).
#[derive(Clone, Debug)]
pub struct SelectionStrategy {
    config: StrategyConfig,
    groups: Vec<HostGroupRing>,
    selectors: Vec<ConsistentHashSelector>,
    num_parents: u32,
}

impl SelectionStrategy {
    /// Builds a strategy from validated configuration and host-group rings.
    /// `groups` must be non-empty and within [`MAX_GROUP_RINGS`]; the
    /// per-group emptiness invariant is already enforced by
    /// [`HostGroupRing::new`].
    pub fn new(config: StrategyConfig, groups: Vec<HostGroupRing>) -> Result<Self, ConfigRejected> {
        if groups.is_empty() {
            return Err(ConfigRejected::new(&config.name, "a strategy needs at least one group"));
        }
        if groups.len() > MAX_GROUP_RINGS {
            return Err(ConfigRejected::new(
                &config.name,
                format!("{} groups exceeds MAX_GROUP_RINGS ({MAX_GROUP_RINGS})", groups.len()),
            ));
        }
        let selectors = groups.iter().map(ConsistentHashSelector::build).collect();
        let num_parents = groups.iter().map(|g| g.len() as u32).sum();
        Ok(Self {
            config,
            groups,
            selectors,
            num_parents,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn num_parents(&self) -> u32 {
        self.num_parents
    }

    pub fn groups(&self) -> &[HostGroupRing] {
        &self.groups
    }

    /// True iff any host across all groups is currently available per
    /// `health`.
    pub fn next_hop_exists(&self, health: &impl HealthView) -> bool {
        self.groups
            .iter()
            .flat_map(HostGroupRing::iter)
            .any(|h| health.is_available(h))
    }

    /// Picks a parent for the current attempt, or `NoParentAvailable` if the
    /// retry budget is spent or every remaining candidate is unavailable.
    pub fn find_next_hop(
        &self,
        req: &impl RequestContext,
        scratch: &mut Scratchpad,
        health: &impl HealthView,
    ) -> Result<ParentResult, NoParentAvailable> {
        // `attempts` here is the count of picks already made, i.e. exactly
        // the quantity `response_is_retryable` checks after the previous
        // attempt's outcome. Using a strict `>` (not `>=`) against
        // `max_simple_retries` gives `max_simple_retries + 1` total attempts,
        // matching the `Bounded attempts` property and the S3 scenario.
        if scratch.attempts > self.config.max_simple_retries || scratch.attempts >= self.num_parents {
            return Err(NoParentAvailable);
        }

        let fingerprint = *scratch
            .fingerprint
            .get_or_insert_with(|| fingerprint_bytes(req.fingerprint_key()));

        let groups_len = self.groups.len() as u32;
        let order: Vec<u32> = match self.config.ring_mode {
            RingMode::ExhaustRing => (scratch.current_group..groups_len).collect(),
            RingMode::AlternateRing => (0..groups_len)
                .map(|i| (scratch.current_group + i) % groups_len)
                .collect(),
        };

        for group in order {
            if let Some(host_index) = self.pick_in_group(group, fingerprint, scratch, health) {
                scratch.visited[group as usize][host_index as usize] = true;
                scratch.attempts += 1;
                scratch.last_group = group;
                scratch.last_host = host_index;
                scratch.current_group = match self.config.ring_mode {
                    RingMode::ExhaustRing => group,
                    RingMode::AlternateRing => (group + 1) % groups_len,
                };
                return Ok(self.to_parent_result(group, host_index, scratch.attempts));
            }
        }
        Err(NoParentAvailable)
    }

    /// Scans group `group`'s ring for the next unvisited, available host,
    /// starting from `fingerprint`'s ring position. The very first scan of
    /// a group (nothing visited in it yet) goes straight to the ring's
    /// `first` host per spec §4.5; later scans within the same group walk
    /// forward from there via `next`. Hosts found unavailable during the
    /// scan are marked visited too, so the same attempt never re-examines
    /// them.
    fn pick_in_group(
        &self,
        group: u32,
        fingerprint: u64,
        scratch: &mut Scratchpad,
        health: &impl HealthView,
    ) -> Option<u32> {
        let ring = &self.groups[group as usize];
        let selector = &self.selectors[group as usize];

        let untouched = scratch.visited[group as usize].iter().all(|&v| !v);
        if untouched {
            let first = selector.first(fingerprint);
            if health.is_available(ring.at(first)) {
                return Some(first);
            }
            scratch.visited[group as usize][first as usize] = true;
        }

        loop {
            let visited = &scratch.visited[group as usize];
            let candidate = selector.next(fingerprint, visited)?;
            if health.is_available(ring.at(candidate)) {
                return Some(candidate);
            }
            scratch.visited[group as usize][candidate as usize] = true;
        }
    }

    fn to_parent_result(&self, group: u32, host_index: u32, attempt: u32) -> ParentResult {
        let host = self.groups[group as usize].at(host_index);
        let protocol = host.protocol_for(self.config.scheme);
        let scheme = if self.config.scheme == Scheme::None {
            protocol.scheme
        } else {
            self.config.scheme
        };
        ParentResult {
            hostname: host.hostname().to_string(),
            port: protocol.port,
            scheme,
            is_retry: attempt > 1,
            attempt,
        }
    }

    /// Reports the outcome of the most recent `find_next_hop` pick: a
    /// non-failure status marks the parent up (passive recovery hint), a
    /// 5xx or connection failure marks it down. Best-effort; never blocks.
    pub fn mark(&self, scratch: &Scratchpad, outcome: Outcome, health: &impl HealthView) {
        let host = self.host_at(scratch.last_group, scratch.last_host);
        match outcome {
            Outcome::Connected { status } => {
                if !self.config.resp_codes.contains(status) {
                    health.mark_up(host);
                } else if on_failure_mark_parent_down(status) {
                    health.mark_down(host, DownReason::Passive5xx);
                }
                // Non-5xx failure status (e.g. 4xx in resp_codes): retryable
                // per config, but not itself grounds to mark the parent down.
            }
            Outcome::ConnectFailure => {
                health.mark_down(host, DownReason::ConnectFail);
            }
        }
    }

    /// Whether the proxy should retry, bypass to origin, or give up, given
    /// the outcome of the most recent attempt. Callers only need consult
    /// this for failing outcomes (`code_is_failure`); for a successful
    /// outcome the transaction is already done.
    pub fn should_retry(&self, scratch: &Scratchpad, outcome: Outcome) -> Decision {
        let code = outcome.status_code();
        if response_is_retryable(
            &self.config.resp_codes,
            scratch.attempts,
            code,
            self.config.max_simple_retries,
            self.num_parents,
        ) {
            return Decision::Retry;
        }
        if code_is_failure(&self.config.resp_codes, code) {
            if self.config.go_direct {
                Decision::GoDirect
            } else {
                Decision::Fail
            }
        } else {
            Decision::Fail
        }
    }

    fn host_at(&self, group: u32, host_index: u32) -> &HostRecord {
        self.groups[group as usize].at(host_index)
    }

    /// Iterates every host across every group, for callers (e.g. the config
    /// loader's self-detect pass) that need to walk the whole topology.
    pub fn all_hosts(&self) -> impl Iterator<Item = &HostRecord> {
        self.groups.iter().flat_map(HostGroupRing::iter)
    }
}
