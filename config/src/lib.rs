#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Turns the declarative YAML strategy document (spec §6) into a validated
//! [`SelectionStrategy`].
//!
//! Grounded on `policy-controller/k8s/index`'s pattern of a `Raw*`
//! deserialize layer validated into the real domain type one field at a
//! time, collecting non-fatal warnings instead of aborting the whole
//! document over one bad fragment.

mod raw;

use std::path::Path;
use std::sync::Arc;

use parent_selector_core::{
    ConfigRejected, ConfigWarning, DownReason, HealthChecks, HealthView, HostGroupRing, HostRecord,
    Protocol, RingMode, Scheme, SelectionStrategy, StrategyConfig, MAX_GROUP_RINGS,
};
use raw::{RawDocument, RawHost};

/// Parses and validates a strategy document from a string.
///
/// `health` is the strategy's freshly-chosen [`HealthView`] handle, used
/// only to apply the self-detect pass (spec §4.3): any host whose hostname
/// `is_self` returns true for is immediately marked down with
/// [`DownReason::SelfDetect`], unless the document sets
/// `ignore_self_detect`.
///
/// Individual bad fragments (an out-of-range response code, an unrecognized
/// scheme, too many groups) are dropped and reported as warnings; the
/// document is rejected outright only when `groups` is missing, empty, not
/// a sequence, or every group ends up empty after filtering.
pub fn load_str<H: HealthView>(
    yaml: &str,
    health: &H,
    is_self: impl Fn(&str) -> bool,
) -> Result<(Arc<SelectionStrategy>, Vec<ConfigWarning>), ConfigRejected> {
    let doc: RawDocument = serde_yaml::from_str(yaml)
        .map_err(|e| ConfigRejected::new("<unparsed>", format!("invalid YAML: {e}")))?;
    build(doc.strategy, health, is_self)
}

/// Convenience wrapper over [`load_str`] that reads the document from a file
/// first. File I/O errors surface as a [`ConfigRejected`] with strategy name
/// `<unreadable>`, since the name inside the document hasn't been parsed yet.
pub fn load_path<H: HealthView>(
    path: impl AsRef<Path>,
    health: &H,
    is_self: impl Fn(&str) -> bool,
) -> Result<(Arc<SelectionStrategy>, Vec<ConfigWarning>), ConfigRejected> {
    let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        ConfigRejected::new("<unreadable>", format!("{}: {e}", path.as_ref().display()))
    })?;
    load_str(&text, health, is_self)
}

fn build<H: HealthView>(
    raw: raw::RawStrategy,
    health: &H,
    is_self: impl Fn(&str) -> bool,
) -> Result<(Arc<SelectionStrategy>, Vec<ConfigWarning>), ConfigRejected> {
    let name = raw.name.clone();
    let mut warnings = Vec::new();

    if raw.groups.is_empty() {
        return Err(ConfigRejected::new(&name, "groups must contain at least one group"));
    }

    let mut raw_groups = raw.groups;
    if raw_groups.len() > MAX_GROUP_RINGS {
        let extra = raw_groups.len() - MAX_GROUP_RINGS;
        warnings.push(ConfigWarning::GroupCapExceeded {
            strategy_name: name.clone(),
            extra,
            max: MAX_GROUP_RINGS,
        });
        raw_groups.truncate(MAX_GROUP_RINGS);
    }

    let mut groups = Vec::with_capacity(raw_groups.len());
    for (group_index, raw_hosts) in raw_groups.into_iter().enumerate() {
        let group_index = group_index as u32;
        let mut hosts = Vec::with_capacity(raw_hosts.len());
        for raw_host in raw_hosts {
            if let Some(host) = build_host(&name, raw_host, group_index, hosts.len() as u32, &mut warnings) {
                hosts.push(host);
            }
        }
        if hosts.is_empty() {
            return Err(ConfigRejected::new(
                &name,
                format!("group {group_index} has no hosts with a valid protocol"),
            ));
        }
        groups.push(HostGroupRing::new(hosts));
    }

    let scheme = parse_scheme(&raw.scheme).unwrap_or_else(|| {
        warnings.push(ConfigWarning::InvalidScheme {
            strategy_name: name.clone(),
            host: "<strategy>".to_string(),
            scheme: raw.scheme.clone(),
        });
        Scheme::Http
    });

    let ring_mode = match raw.failover.ring_mode.as_str() {
        "alternate_ring" => RingMode::AlternateRing,
        _ => RingMode::ExhaustRing,
    };

    let mut codes = Vec::with_capacity(raw.failover.response_codes.len());
    for code in raw.failover.response_codes {
        if (301..=598).contains(&code) {
            codes.push(code as u16);
        } else {
            warnings.push(ConfigWarning::InvalidResponseCode {
                strategy_name: name.clone(),
                code,
            });
        }
    }

    let health_checks = HealthChecks {
        active: raw.failover.health_check.iter().any(|s| s == "active"),
        passive: raw.failover.health_check.iter().any(|s| s == "passive"),
    };

    let config = StrategyConfig {
        name: name.clone(),
        scheme,
        go_direct: raw.go_direct,
        parent_is_proxy: raw.parent_is_proxy,
        ignore_self_detect: raw.ignore_self_detect,
        ring_mode,
        max_simple_retries: raw.failover.max_simple_retries,
        resp_codes: parent_selector_core::ResponseCodeSet::new(codes),
        health_checks,
    };

    let strategy = SelectionStrategy::new(config, groups)?;

    if !strategy.config().ignore_self_detect {
        for host in strategy.all_hosts() {
            if is_self(host.hostname()) {
                tracing::warn!(host = host.hostname(), "self-detect: marking own host down");
                health.mark_down(host, DownReason::SelfDetect);
            }
        }
    }

    Ok((Arc::new(strategy), warnings))
}

fn build_host(
    strategy_name: &str,
    raw_host: RawHost,
    group_index: u32,
    host_index: u32,
    warnings: &mut Vec<ConfigWarning>,
) -> Option<HostRecord> {
    let mut protocols = Vec::with_capacity(raw_host.protocol.len());
    for p in raw_host.protocol {
        match parse_scheme(&p.scheme) {
            Some(scheme) => {
                let mut protocol = Protocol::new(scheme, p.port);
                if let Some(url) = p.health_check_url {
                    protocol = protocol.with_health_check_url(url);
                }
                protocols.push(protocol);
            }
            None => warnings.push(ConfigWarning::InvalidScheme {
                strategy_name: strategy_name.to_string(),
                host: raw_host.host.clone(),
                scheme: p.scheme.clone(),
            }),
        }
    }
    if protocols.is_empty() {
        tracing::warn!(host = raw_host.host.as_str(), "host has no valid protocols, dropping");
        return None;
    }
    Some(HostRecord::new(
        raw_host.host,
        protocols,
        raw_host.weight,
        raw_host.hash_string,
        group_index,
        host_index,
    ))
}

fn parse_scheme(s: &str) -> Option<Scheme> {
    match s {
        "http" => Some(Scheme::Http),
        "https" => Some(Scheme::Https),
        "none" => Some(Scheme::None),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parent_selector_core::Outcome;

    struct FakeHealth {
        down: std::sync::Mutex<std::collections::HashSet<(u32, u32)>>,
    }

    impl FakeHealth {
        fn new() -> Self {
            Self {
                down: std::sync::Mutex::new(std::collections::HashSet::new()),
            }
        }
    }

    impl HealthView for FakeHealth {
        fn is_available(&self, host: &HostRecord) -> bool {
            !self.down.lock().unwrap().contains(&host.key())
        }

        fn mark_down(&self, host: &HostRecord, _reason: DownReason) {
            self.down.lock().unwrap().insert(host.key());
        }

        fn mark_up(&self, host: &HostRecord) {
            self.down.lock().unwrap().remove(&host.key());
        }
    }

    const BASIC_YAML: &str = r#"
strategy:
  name: origin-pool
  scheme: http
  go_direct: true
  failover:
    ring_mode: exhaust_ring
    max_simple_retries: 5
    response_codes: [503, 502]
    health_check: [passive]
  groups:
    - - host: a.example.com
        protocol:
          - { scheme: http, port: 80 }
      - host: b.example.com
        protocol:
          - { scheme: http, port: 80 }
"#;

    #[test]
    fn loads_well_formed_document() {
        let health = FakeHealth::new();
        let (strategy, warnings) = load_str(BASIC_YAML, &health, |_| false).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(strategy.name(), "origin-pool");
        assert_eq!(strategy.num_parents(), 2);
        assert!(strategy.config().go_direct);
    }

    #[test]
    fn drops_invalid_response_code_with_warning() {
        let yaml = BASIC_YAML.replace("[503, 502]", "[503, 12, 700]");
        let health = FakeHealth::new();
        let (strategy, warnings) = load_str(&yaml, &health, |_| false).unwrap();
        assert!(strategy.config().resp_codes.contains(503));
        assert!(!strategy.config().resp_codes.contains(12));
        assert!(!strategy.config().resp_codes.contains(700));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn rejects_missing_groups() {
        let yaml = r#"
strategy:
  name: broken
  scheme: http
  groups: []
"#;
        let health = FakeHealth::new();
        let err = load_str(yaml, &health, |_| false).unwrap_err();
        assert_eq!(err.strategy_name, "broken");
    }

    #[test]
    fn rejects_malformed_groups_shape() {
        let yaml = r#"
strategy:
  name: broken
  scheme: http
  groups: "not-a-sequence"
"#;
        let health = FakeHealth::new();
        assert!(load_str(yaml, &health, |_| false).is_err());
    }

    #[test]
    fn group_cap_exceeded_drops_extra_groups_with_warning() {
        let mut yaml = String::from(
            r#"
strategy:
  name: too-many-groups
  scheme: http
  groups:
"#,
        );
        for i in 0..40 {
            yaml.push_str(&format!(
                "    - - host: h{i}.example.com\n        protocol:\n          - {{ scheme: http, port: 80 }}\n"
            ));
        }
        let health = FakeHealth::new();
        let (strategy, warnings) = load_str(&yaml, &health, |_| false).unwrap();
        assert_eq!(strategy.groups().len(), MAX_GROUP_RINGS);
        assert!(warnings
            .iter()
            .any(|w| matches!(w, ConfigWarning::GroupCapExceeded { extra: 8, .. })));
    }

    /// S6 — self-detect: a host whose hostname resolves to the local
    /// process is marked down at load time unless ignore_self_detect is set.
    #[test]
    fn self_detect_marks_own_host_down_at_load() {
        let health = FakeHealth::new();
        let (strategy, _warnings) =
            load_str(BASIC_YAML, &health, |h| h == "a.example.com").unwrap();
        let a = strategy.all_hosts().find(|h| h.hostname() == "a.example.com").unwrap();
        assert!(!health.is_available(a));
        let b = strategy.all_hosts().find(|h| h.hostname() == "b.example.com").unwrap();
        assert!(health.is_available(b));
    }

    #[test]
    fn ignore_self_detect_skips_the_pass() {
        let yaml = BASIC_YAML.replace("go_direct: true", "go_direct: true\n  ignore_self_detect: true");
        let health = FakeHealth::new();
        let (strategy, _warnings) = load_str(&yaml, &health, |h| h == "a.example.com").unwrap();
        let a = strategy.all_hosts().find(|h| h.hostname() == "a.example.com").unwrap();
        assert!(health.is_available(a));
    }

    #[test]
    fn invalid_host_scheme_drops_only_that_protocol_entry() {
        let yaml = r#"
strategy:
  name: mixed-protocols
  scheme: http
  groups:
    - - host: a.example.com
        protocol:
          - { scheme: carrier-pigeon, port: 80 }
          - { scheme: http, port: 81 }
"#;
        let health = FakeHealth::new();
        let (strategy, warnings) = load_str(yaml, &health, |_| false).unwrap();
        let a = strategy.all_hosts().next().unwrap();
        assert_eq!(a.protocols().len(), 1);
        assert_eq!(a.protocols()[0].port, 81);
        assert!(warnings.iter().any(|w| matches!(w, ConfigWarning::InvalidScheme { .. })));
    }

    #[test]
    fn loaded_strategy_can_drive_a_transaction() {
        let health = FakeHealth::new();
        let (strategy, _) = load_str(BASIC_YAML, &health, |_| false).unwrap();
        struct Req;
        impl parent_selector_core::RequestContext for Req {
            fn fingerprint_key(&self) -> &[u8] {
                b"/foo"
            }
            fn transaction_id(&self) -> u64 {
                1
            }
        }
        let mut scratch = parent_selector_core::Scratchpad::new(&strategy);
        let pick = strategy.find_next_hop(&Req, &mut scratch, &health).unwrap();
        assert!(pick.hostname == "a.example.com" || pick.hostname == "b.example.com");
        strategy.mark(&scratch, Outcome::Connected { status: 200 }, &health);
    }
}
