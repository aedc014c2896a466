#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! The next-hop selection engine for an HTTP forward/reverse proxy.
//!
//! This crate owns the strategy evaluator and its retry/failover state
//! machine, the host-record model it selects over, and the interface it
//! uses to read and report host health. It does not open sockets, parse
//! HTTP, or schedule timers; see [`health::HealthView`] and
//! [`request::RequestContext`] for the boundaries the embedding proxy fills
//! in.

mod error;
mod hash_ring;
mod health;
mod host;
mod request;
mod resp_codes;
mod retry;
mod ring;
mod strategy;

pub use error::{ConfigRejected, ConfigWarning};
pub use health::{DownReason, HealthView};
pub use host::{HostRecord, Protocol, Scheme};
pub use request::RequestContext;
pub use resp_codes::{ResponseCodeSet, STATUS_CONNECTION_FAILURE};
pub use retry::{code_is_failure, on_failure_mark_parent_down, response_is_retryable};
pub use ring::HostGroupRing;
pub use strategy::{
    Decision, HealthChecks, NoParentAvailable, Outcome, ParentResult, RingMode, Scratchpad,
    SelectionStrategy, StrategyConfig,
};

/// Upper bound on the number of host-group rings a single strategy may own.
pub const MAX_GROUP_RINGS: usize = 32;
