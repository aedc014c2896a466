use thiserror::Error;

/// A whole strategy document was rejected at construction time. The rest of
/// the configuration (other named strategies) still loads; this one is
/// dropped.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("strategy {strategy_name:?} rejected: {reason}")]
pub struct ConfigRejected {
    pub strategy_name: String,
    pub reason: String,
}

impl ConfigRejected {
    pub fn new(strategy_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            strategy_name: strategy_name.into(),
            reason: reason.into(),
        }
    }
}

/// A recoverable problem with one fragment of a strategy document. The
/// offending fragment is dropped and loading continues.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigWarning {
    #[error("strategy {strategy_name:?}: invalid scheme {scheme:?} for host {host:?}, falling back to the host's first protocol")]
    InvalidScheme {
        strategy_name: String,
        host: String,
        scheme: String,
    },

    #[error("strategy {strategy_name:?}: response code {code} out of range (300, 599), dropped")]
    InvalidResponseCode { strategy_name: String, code: i64 },

    #[error("strategy {strategy_name:?}: {extra} group(s) beyond MAX_GROUP_RINGS ({max}) dropped")]
    GroupCapExceeded {
        strategy_name: String,
        extra: usize,
        max: usize,
    },
}
