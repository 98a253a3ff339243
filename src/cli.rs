// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things). Every tuning option can
// also come from a PAGE_INSPECTOR_* environment variable (clap's `env`
// feature), which is handy in CI.
// =============================================================================

use clap::builder::TypedValueParser; // gives value parsers their .map()
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::time::Duration;

use crate::config::{self, InspectorConfig};

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "page-inspector",
    version,
    about = "Analyze a web page's structure and check which of its links are unreachable",
    long_about = "page-inspector fetches one web page and reports its HTML version, title, \
                  heading counts, internal/external link counts, how many links are \
                  unreachable, and whether it contains a login form."
)]
pub struct Cli {
    /// Minimum log level written to stderr (RUST_LOG is read too)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true, env = "PAGE_INSPECTOR_LOG_LEVEL")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a page and print its report
    ///
    /// Example: page-inspector report https://example.com --json
    Report {
        /// Page URL to analyze (http or https)
        url: String,

        /// Output the report in JSON format instead of a table
        #[arg(long)]
        json: bool,

        /// Give up on the whole analysis after this many seconds
        #[arg(long, env = "PAGE_INSPECTOR_DEADLINE_SECS")]
        deadline_secs: Option<u64>,

        #[command(flatten)]
        settings: Settings,
    },
}

/// Tuning knobs that end up in [`InspectorConfig`].
#[derive(Args, Debug)]
pub struct Settings {
    /// Seconds to wait for the page itself
    #[arg(long, default_value_t = config::FETCH_TIMEOUT.as_secs(), env = "PAGE_INSPECTOR_FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: u64,

    /// Seconds to wait for each link probe
    #[arg(long, default_value_t = config::PROBE_TIMEOUT.as_secs(), env = "PAGE_INSPECTOR_PROBE_TIMEOUT_SECS")]
    pub probe_timeout_secs: u64,

    /// How many links may be probed at the same time
    #[arg(
        long,
        default_value_t = config::MAX_CONCURRENT_PROBES,
        value_parser = clap::value_parser!(u16).range(1..).map(usize::from),
        env = "PAGE_INSPECTOR_MAX_CONCURRENT_PROBES"
    )]
    pub max_concurrent_probes: usize,

    /// User-Agent header sent with every request
    #[arg(long, default_value = config::DEFAULT_USER_AGENT, env = "PAGE_INSPECTOR_USER_AGENT")]
    pub user_agent: String,

    /// Redirects to follow before a request counts as failed
    #[arg(long, default_value_t = config::MAX_REDIRECTS, env = "PAGE_INSPECTOR_MAX_REDIRECTS")]
    pub max_redirects: usize,
}

impl Settings {
    pub fn into_config(self) -> InspectorConfig {
        InspectorConfig {
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
            max_concurrent_probes: self.max_concurrent_probes,
            user_agent: self.user_agent,
            max_redirects: self.max_redirects,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}
