#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use parent_selector_core::{Decision, Outcome, RequestContext, Scratchpad, STATUS_CONNECTION_FAILURE};
use parent_selector_health::InMemoryHealthStore;

struct SimRequest {
    key: Vec<u8>,
    id: u64,
}

impl RequestContext for SimRequest {
    fn fingerprint_key(&self) -> &[u8] {
        &self.key
    }

    fn transaction_id(&self) -> u64 {
        self.id
    }
}

fn main() -> Result<()> {
    let args = cli::Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let health = InMemoryHealthStore::new();
    let is_self = |host: &str| args.self_hostname.as_deref() == Some(host);
    let (strategy, warnings) = parent_selector_config::load_path(&args.config, &health, is_self)
        .with_context(|| format!("loading {}", args.config.display()))?;

    for warning in &warnings {
        tracing::warn!(%warning);
    }

    match args.command {
        cli::Command::Check => {
            println!(
                "strategy {:?}: {} group(s), {} parent(s), ring_mode={:?}, max_simple_retries={}",
                strategy.name(),
                strategy.groups().len(),
                strategy.num_parents(),
                strategy.config().ring_mode,
                strategy.config().max_simple_retries,
            );
            if warnings.is_empty() {
                println!("no warnings");
            }
        }
        cli::Command::Simulate { request_key, outcomes } => {
            let req = SimRequest {
                key: request_key.into_bytes(),
                id: 1,
            };
            let mut scratch = Scratchpad::new(&strategy);
            let mut outcomes = outcomes.into_iter();

            loop {
                let pick = match strategy.find_next_hop(&req, &mut scratch, &health) {
                    Ok(pick) => pick,
                    Err(_) => {
                        println!("no parent available after {} attempt(s)", scratch.attempts());
                        break;
                    }
                };
                println!(
                    "attempt {}: {}:{} ({:?}, retry={})",
                    pick.attempt, pick.hostname, pick.port, pick.scheme, pick.is_retry
                );

                let Some(raw_outcome) = outcomes.next() else {
                    println!("outcome sequence exhausted, stopping before reporting an outcome");
                    break;
                };
                let outcome = parse_outcome(&raw_outcome)?;
                strategy.mark(&scratch, outcome, &health);

                let code = match outcome {
                    Outcome::Connected { status } => status,
                    Outcome::ConnectFailure => STATUS_CONNECTION_FAILURE,
                };
                if !strategy.config().resp_codes.contains(code) {
                    println!("succeeded with status {code}");
                    break;
                }
                match strategy.should_retry(&scratch, outcome) {
                    Decision::Retry => continue,
                    Decision::GoDirect => {
                        println!("retries exhausted, going direct to origin");
                        break;
                    }
                    Decision::Fail => {
                        println!("retries exhausted, failing the transaction");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

fn parse_outcome(raw: &str) -> Result<Outcome> {
    if raw.eq_ignore_ascii_case("fail") {
        return Ok(Outcome::ConnectFailure);
    }
    let status: u16 = raw
        .parse()
        .with_context(|| format!("outcome {raw:?} is neither a status code nor \"fail\""))?;
    if !(100..1000).contains(&status) {
        bail!("outcome {raw:?} is not a plausible HTTP status code");
    }
    Ok(Outcome::Connected { status })
}
