use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[clap(name = "parent-selector", about = "Next-hop parent selection engine")]
pub struct Args {
    /// Path to a strategy document (see the YAML shape in the README).
    #[clap(long, short = 'c', env = "PARENT_SELECTOR_CONFIG")]
    pub config: PathBuf,

    /// `tracing-subscriber` `EnvFilter` directive string.
    #[clap(
        long,
        default_value = "parent_selector=info,warn",
        env = "PARENT_SELECTOR_LOG"
    )]
    pub log_level: String,

    /// Hostname this process is reachable as, for self-detect filtering at
    /// load time. Omit to disable self-detect entirely for this run.
    #[clap(long)]
    pub self_hostname: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Loads the strategy document and drives one transaction through a
    /// scripted sequence of outcomes, printing each pick and the final
    /// decision.
    Simulate {
        /// Opaque key used to compute the consistent-hash fingerprint for
        /// this transaction (e.g. a request path).
        #[clap(long, default_value = "/")]
        request_key: String,

        /// One outcome per attempt: an HTTP status code, or the literal
        /// `fail` for a connection failure. The transaction stops early if
        /// the sequence runs out before a terminal decision is reached.
        #[clap(required = true)]
        outcomes: Vec<String>,
    },
    /// Loads and validates the strategy document, printing any warnings and
    /// a summary of its topology, then exits.
    Check,
}
