// src/config.rs
// =============================================================================
// Runtime settings for a page inspection.
//
// Every value has a sensible default (see the constants below). The CLI in
// src/cli.rs lets users override each one with a flag or a PAGE_INSPECTOR_*
// environment variable.
// =============================================================================

use std::time::Duration;

/// How long the target page may take to respond, body included.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a single link probe may take.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

// Upper bound on parallel link probes. Pages with hundreds of links would
// otherwise trip firewalls and DDoS protection on the hosts we probe.
pub const MAX_CONCURRENT_PROBES: usize = 20;

/// Redirects followed before a request is treated as failed.
pub const MAX_REDIRECTS: usize = 10;

pub const DEFAULT_USER_AGENT: &str = concat!("page-inspector/", env!("CARGO_PKG_VERSION"));

/// Settings shared by the fetcher, the link prober and the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorConfig {
    pub fetch_timeout: Duration,
    pub probe_timeout: Duration,
    /// The CLI rejects 0; LinkAnalyzer raises a 0 from elsewhere to 1.
    pub max_concurrent_probes: usize,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: FETCH_TIMEOUT,
            probe_timeout: PROBE_TIMEOUT,
            max_concurrent_probes: MAX_CONCURRENT_PROBES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: MAX_REDIRECTS,
        }
    }
}
