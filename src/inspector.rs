// src/inspector.rs
// =============================================================================
// The single entry point the front end calls: URL in, PageReport out.
//
//   raw URL -> validate -> fetch page -> analyze markup + links -> report
//
// Any failure before the report exists aborts the whole request; the caller
// gets either a complete report or one error, never something in between.
//
// The Inspector owns nothing request-specific. It can serve many
// get_report calls at once; each call builds its own semaphore and counters
// inside the link analyzer.
// =============================================================================

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::analyzer::{LinkAnalyzer, PageAnalyzer};
use crate::config::InspectorConfig;
use crate::error::AnalyzeError;
use crate::fetch::fetch_page;
use crate::report::PageReport;
use crate::transport::HttpTransport;

pub struct Inspector {
    /// Shared by the page fetch and every link probe
    transport: Arc<dyn HttpTransport>,
    config: InspectorConfig,
    pages: PageAnalyzer,
}

impl Inspector {
    // Builds an inspector on top of `transport`
    //
    // Parameters:
    //   transport: the HTTP capability; one instance (and one connection
    //              pool) serves the page fetch and all link probes
    //   config: timeouts and the probe ceiling
    pub fn new(transport: Arc<dyn HttpTransport>, config: InspectorConfig) -> Self {
        // The link analyzer gets its own handle to the same transport.
        // Arc::clone only bumps a reference count, it does not copy the client
        let links = LinkAnalyzer::new(
            Arc::clone(&transport),
            config.probe_timeout,
            config.max_concurrent_probes,
        );

        Self {
            transport,
            config,
            pages: PageAnalyzer::new(links),
        }
    }

    // Fetches `raw_url` and produces its report
    //
    // Parameters:
    //   cancel: the caller's token; once fired, no report is produced
    //   raw_url: what the user typed, not validated yet
    //
    // Returns:
    //   Ok(PageReport) = every field filled in
    //   Err(InvalidUrl) = rejected before any network I/O
    //   Err(Http | Network | BodyRead) = the page itself could not be fetched
    //   Err(Cancelled) = the token fired at any point
    pub async fn get_report(
        &self,
        cancel: &CancellationToken,
        raw_url: &str,
    ) -> Result<PageReport, AnalyzeError> {
        // Step 1: make sure we have an absolute http(s) URL
        let url = validate_target_url(raw_url)?;
        log::info!("Analyzing {}", url);

        // Step 2: download the page (one GET, bounded by the fetch timeout)
        let body = fetch_page(
            self.transport.as_ref(),
            cancel,
            &url,
            self.config.fetch_timeout,
        )
        .await?;
        log::debug!("Fetched {} byte(s) from {}", body.len(), url);

        // Step 3: read the markup, then classify and probe its links
        let report = self.pages.analyze(cancel, &body, url.as_str()).await?;

        // Step 4: counts from a cancelled run are incomplete; do not present them
        if cancel.is_cancelled() {
            return Err(AnalyzeError::Cancelled {
                url: url.to_string(),
            });
        }

        log::info!(
            "Analyzed {}: {} internal, {} external, {} unreachable link(s)",
            url,
            report.internal_links(),
            report.external_links(),
            report.unreachable_links()
        );

        Ok(report)
    }
}

// Accepts only absolute http(s) URLs with a host
//
// Returns the parsed URL on success. Leading/trailing whitespace is ignored
// because it usually comes from copy-paste.
pub fn validate_target_url(raw_url: &str) -> Result<Url, AnalyzeError> {
    // Small helper so every rejection carries the original input
    let invalid = |reason: &str| AnalyzeError::InvalidUrl {
        url: raw_url.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = raw_url.trim();
    if trimmed.is_empty() {
        return Err(invalid("a URL is required"));
    }

    // Url::parse rejects relative input like "example.com" (no scheme)
    let url = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;

    // mailto:, ftp:, file: and friends parse fine but cannot be fetched
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("only http and https URLs can be analyzed"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("URL has no host"));
    }

    Ok(url)
}
