use serde::Deserialize;

/// The top-level YAML document: `{ strategy: { ... } }`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawDocument {
    pub(crate) strategy: RawStrategy,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawStrategy {
    pub(crate) name: String,
    pub(crate) scheme: String,
    #[serde(default)]
    pub(crate) go_direct: bool,
    #[serde(default)]
    pub(crate) parent_is_proxy: bool,
    #[serde(default)]
    pub(crate) ignore_self_detect: bool,
    #[serde(default)]
    pub(crate) failover: RawFailover,
    pub(crate) groups: Vec<Vec<RawHost>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawFailover {
    #[serde(default = "default_ring_mode")]
    pub(crate) ring_mode: String,
    #[serde(default)]
    pub(crate) max_simple_retries: u32,
    #[serde(default)]
    pub(crate) response_codes: Vec<i64>,
    #[serde(default)]
    pub(crate) health_check: Vec<String>,
}

fn default_ring_mode() -> String {
    "exhaust_ring".to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawHost {
    pub(crate) host: String,
    pub(crate) protocol: Vec<RawProtocol>,
    #[serde(default = "default_weight")]
    pub(crate) weight: f64,
    #[serde(default)]
    pub(crate) hash_string: Option<String>,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawProtocol {
    pub(crate) scheme: String,
    pub(crate) port: u16,
    #[serde(default)]
    pub(crate) health_check_url: Option<String>,
}
