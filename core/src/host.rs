/// The scheme a parent is reached over, or reported to the proxy for a
/// per-protocol endpoint.
///
/// `None` means "no scheme constraint" — the strategy's own [`scheme`] filter
/// still applies, but this particular protocol entry doesn't express a
/// preference.
///
/// [`scheme`]: crate::strategy::StrategyConfig::scheme
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    None,
}

/// One reachable endpoint for a host: a scheme, a port, and an optional
/// health-check URL used by the (external) active-probing subsystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Protocol {
    pub scheme: Scheme,
    pub port: u16,
    pub health_check_url: Option<String>,
}

impl Protocol {
    pub fn new(scheme: Scheme, port: u16) -> Self {
        Self {
            scheme,
            port,
            health_check_url: None,
        }
    }

    pub fn with_health_check_url(mut self, url: impl Into<String>) -> Self {
        self.health_check_url = Some(url.into());
        self
    }
}

/// An immutable-after-load descriptor of one upstream parent.
///
/// Equality, ordering, and hashing for ring placement are all driven by
/// [`hash_seed`](HostRecord::hash_seed), not by the record as a whole —
/// availability is deliberately not part of this type; it's a logical
/// property the strategy derives by asking a [`HealthView`](crate::HealthView).
#[derive(Clone, Debug, PartialEq)]
pub struct HostRecord {
    hostname: String,
    protocols: Vec<Protocol>,
    weight: f64,
    hash_string: Option<String>,
    group_index: u32,
    host_index: u32,
}

impl HostRecord {
    /// Builds a host record. `protocols` must be non-empty; `weight` must be
    /// positive. `group_index`/`host_index` are assigned by the ring/strategy
    /// builder, not chosen by callers of this constructor directly.
    pub fn new(
        hostname: impl Into<String>,
        protocols: Vec<Protocol>,
        weight: f64,
        hash_string: Option<String>,
        group_index: u32,
        host_index: u32,
    ) -> Self {
        assert!(!protocols.is_empty(), "host record needs at least one protocol");
        assert!(weight > 0.0, "host weight must be positive");
        Self {
            hostname: hostname.into(),
            protocols,
            weight,
            hash_string,
            group_index,
            host_index,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn protocols(&self) -> &[Protocol] {
        &self.protocols
    }

    /// The first protocol entry matching `scheme`, or the first protocol at
    /// all if `scheme` is [`Scheme::None`].
    pub fn protocol_for(&self, scheme: Scheme) -> &Protocol {
        if scheme == Scheme::None {
            return &self.protocols[0];
        }
        self.protocols
            .iter()
            .find(|p| p.scheme == scheme)
            .unwrap_or(&self.protocols[0])
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// The seed used to place this host on the consistent-hash ring:
    /// `hash_string` if present, else `hostname`.
    pub fn hash_seed(&self) -> &str {
        self.hash_string.as_deref().unwrap_or(&self.hostname)
    }

    pub fn group_index(&self) -> u32 {
        self.group_index
    }

    pub fn host_index(&self) -> u32 {
        self.host_index
    }

    /// The `(group_index, host_index)` pair that uniquely identifies this
    /// record within its strategy, and is the key the [`HealthView`](crate::HealthView)
    /// and retry scratchpad both index by.
    pub fn key(&self) -> (u32, u32) {
        (self.group_index, self.host_index)
    }
}
