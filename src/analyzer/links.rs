// src/analyzer/links.rs
// =============================================================================
// Classifies a page's links and probes every one of them for reachability.
//
// How it works:
// 1. Parse the page URL once; it is the base for relative links
// 2. Resolve every href against it, dropping the ones that do not parse
// 3. Classify each resolved link as internal (same host) or external,
//    in href order, before any request goes out
// 4. Spawn one probe task per link. A semaphore admits at most
//    `max_concurrent_probes` of them at a time; the rest wait for a slot
// 5. Each probe sends a HEAD request under its own timeout. A failed request
//    or a status >= 400 marks the link unreachable
// 6. This function is the only place that reads probe outcomes, so the
//    unreachable count needs no lock
//
// Cancelling the token stops admission, unwinds the probes still in flight,
// and returns counts based on the probes that finished.
//
// Rust concepts:
// - Arc: shared ownership of the transport and semaphore across tasks
// - JoinSet: a group of spawned tasks we can await one by one
// - tokio::select!: wait on whichever of several futures finishes first
// =============================================================================

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::AnalyzeError;
use crate::report::LinkCounts;
use crate::transport::{is_error_status, HttpRequest, HttpTransport};

/// Whether a link stays on the analyzed page's host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkScope {
    Internal,
    External,
}

/// A raw href together with the absolute URL it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReference {
    pub raw: String,
    pub resolved: Url,
    pub scope: LinkScope,
}

/// What a single probe found out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable,
    Unreachable,
    /// The token was cancelled before the probe finished.
    Cancelled,
}

/// Link classification and bounded-concurrency reachability probing.
pub struct LinkAnalyzer {
    transport: Arc<dyn HttpTransport>,
    probe_timeout: Duration,
    max_concurrent_probes: usize,
}

impl LinkAnalyzer {
    // Creates a link analyzer
    //
    // Parameters:
    //   transport: shared HTTP capability, cloned into every probe task
    //   probe_timeout: how long one HEAD request may take
    //   max_concurrent_probes: admission ceiling for probes in flight
    //
    // A ceiling of zero would leave every probe waiting for a slot that never
    // comes, so it is raised to one here. This is the only place that clamps.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        probe_timeout: Duration,
        max_concurrent_probes: usize,
    ) -> Self {
        Self {
            transport,
            probe_timeout,
            max_concurrent_probes: max_concurrent_probes.max(1),
        }
    }

    // Counts internal, external and unreachable links among `raw_refs`
    //
    // Parameters:
    //   cancel: stops admitting new probes and interrupts running ones
    //   base_url: the page URL; relative hrefs are resolved against it
    //   raw_refs: href values in document order, exactly as written
    //
    // Returns:
    //   Ok(LinkCounts) = totals; unreachable <= internal + external
    //   Err(InvalidUrl) = `base_url` itself does not parse
    //
    // Individual links never make this fail. A link that cannot be reached is
    // just counted.
    pub async fn analyze_links(
        &self,
        cancel: &CancellationToken,
        base_url: &str,
        raw_refs: &[String],
    ) -> Result<LinkCounts, AnalyzeError> {
        // Step 1: parse the base once
        let base = Url::parse(base_url).map_err(|e| AnalyzeError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        // Step 2: resolve and classify everything up front
        //
        // The internal/external totals are final before the first request
        // goes out; probing only ever adds to `unreachable`.
        let links = classify_links(&base, raw_refs);
        let mut counts = LinkCounts::default();
        for link in &links {
            log::trace!("{} -> {} ({:?})", link.raw, link.resolved, link.scope);
            match link.scope {
                LinkScope::Internal => counts.internal += 1,
                LinkScope::External => counts.external += 1,
            }
        }

        // Step 3: set up admission control
        //
        // Owned by this call only; concurrent analyses never share slots.
        // Each probe task holds one permit while it runs, so at most
        // `max_concurrent_probes` requests are ever in flight.
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_probes));
        let mut probes = JoinSet::new();

        // Step 4: admit probes one by one, in href order
        for link in links {
            // Wait for a free slot, unless the caller cancels first.
            // `biased` makes select! check cancellation before the semaphore,
            // so a cancelled run never admits another probe even when a slot
            // happens to be free.
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    // Only happens if the semaphore is closed, which we never do
                    Err(_) => break,
                },
            };

            // Everything the task needs must be owned ('static), so clone the
            // Arc and the token instead of borrowing from `self`
            let transport = Arc::clone(&self.transport);
            let cancel = cancel.clone();
            let timeout = self.probe_timeout;
            probes.spawn(async move {
                // Moving the permit in ties the slot to the task's lifetime:
                // it is released when the task ends, however it ends
                let _permit = permit;
                probe_link(transport.as_ref(), &cancel, link.resolved, timeout).await
            });
        }

        // Step 5: collect outcomes
        //
        // This loop is the only reader of probe results, so `counts` is
        // updated from a single place and needs no lock or atomic.
        let mut cancelled = 0;
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok(ProbeOutcome::Unreachable) => counts.unreachable += 1,
                Ok(ProbeOutcome::Reachable) => {}
                Ok(ProbeOutcome::Cancelled) => cancelled += 1,
                // A panicking probe is logged, not counted either way
                Err(e) => log::error!("Link probe task failed: {}", e),
            }
        }

        if cancel.is_cancelled() {
            log::info!(
                "Link check for {} cancelled ({} probe(s) interrupted)",
                base,
                cancelled
            );
        }

        log::debug!(
            "{}: {} internal, {} external, {} unreachable of {} resolved link(s)",
            base,
            counts.internal,
            counts.external,
            counts.unreachable,
            counts.resolved()
        );

        Ok(counts)
    }
}

/// Resolves every href against `base` and tags it internal or external.
///
/// Hrefs that fail to resolve are dropped. Order is preserved.
pub fn classify_links(base: &Url, raw_refs: &[String]) -> Vec<LinkReference> {
    raw_refs
        .iter()
        .filter_map(|raw| match base.join(raw) {
            Ok(resolved) => {
                let scope = if resolved.host_str() == base.host_str() {
                    LinkScope::Internal
                } else {
                    LinkScope::External
                };
                Some(LinkReference {
                    raw: raw.clone(),
                    resolved,
                    scope,
                })
            }
            Err(e) => {
                log::debug!("Skipping unresolvable link '{}': {}", raw, e);
                None
            }
        })
        .collect()
}

// Sends one HEAD request to `link` and reports whether it answered
//
// Parameters:
//   transport: the shared HTTP capability
//   cancel: abandons the request when fired
//   link: absolute URL to probe (owned; its query is rewritten in place)
//   timeout: how long to wait for the response head
//
// Returns:
//   Reachable = any status below 400
//   Unreachable = status >= 400, a transport error, or the timeout fired
//   Cancelled = the token fired before an answer arrived
pub async fn probe_link(
    transport: &dyn HttpTransport,
    cancel: &CancellationToken,
    mut link: Url,
    timeout: Duration,
) -> ProbeOutcome {
    // Normalise the query so equivalent links are sent identically
    canonicalize_query(&mut link);
    let request = HttpRequest::head(link.clone());

    // HEAD only: we care whether the link answers, not what it contains
    let outcome = tokio::select! {
        _ = cancel.cancelled() => return ProbeOutcome::Cancelled,
        outcome = tokio::time::timeout(timeout, transport.execute(request)) => outcome,
    };

    // outcome is Result<Result<HttpResponse, TransportError>, Elapsed>:
    // the outer layer is the timer, the inner one the request itself
    match outcome {
        Ok(Ok(response)) => {
            // Got an answer. The response is dropped at the end of this arm,
            // which discards the (empty) body
            let status = response.status();
            if is_error_status(status) {
                log::warn!("URL is unavailable: {} : HTTP {}", link, status);
                ProbeOutcome::Unreachable
            } else {
                ProbeOutcome::Reachable
            }
        }
        Ok(Err(e)) => {
            // DNS failure, refused connection, too many redirects, ...
            log::warn!("URL is unavailable: {} : {}", link, e);
            ProbeOutcome::Unreachable
        }
        Err(_) => {
            // The timer won
            log::warn!("URL is unavailable: {} : no response within {:?}", link, timeout);
            ProbeOutcome::Unreachable
        }
    }
}

/// Re-encodes the query string in canonical form: pairs sorted by key
/// (stable, so repeated keys keep their order) and form-urlencoded.
pub fn canonicalize_query(link: &mut Url) {
    if link.query().is_none() {
        return;
    }

    // Decode the pairs into owned Strings so we can sort them
    let mut pairs: Vec<(String, String)> = link.query_pairs().into_owned().collect();

    // A bare "?" carries nothing; drop it
    if pairs.is_empty() {
        link.set_query(None);
        return;
    }

    // sort_by is stable, so a=1&a=2 keeps its order
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    link.query_pairs_mut().clear().extend_pairs(pairs);
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Semaphore vs buffer_unordered
//    - buffer_unordered(N) also limits concurrency, but only inside one stream
//    - A Semaphore hands out N permits; a task holding one may run
//    - Owned permits (acquire_owned) can be moved into a spawned task
//
// 2. What is a JoinSet?
//    - A collection of spawned tasks
//    - join_next() gives back results in completion order
//    - Dropping the JoinSet aborts every task still running
//
// 3. Why return ProbeOutcome::Cancelled instead of Unreachable?
//    - A probe we interrupted tells us nothing about the link
//    - Counting it as unreachable would blame the site for our own shutdown
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::{FakeTransport, HostBehavior};

    fn refs(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|r| r.to_string()).collect()
    }

    fn analyzer(transport: Arc<FakeTransport>, ceiling: usize) -> LinkAnalyzer {
        LinkAnalyzer::new(transport, Duration::from_secs(2), ceiling)
    }

    #[test]
    fn test_classify_relative_and_absolute() {
        let base = Url::parse("https://example.com/docs/page").unwrap();
        let links = classify_links(
            &base,
            &refs(&["/about", "guide", "https://example.com/x", "https://rust-lang.org"]),
        );

        let resolved: Vec<_> = links.iter().map(|l| l.resolved.as_str()).collect();
        assert_eq!(
            resolved,
            vec![
                "https://example.com/about",
                "https://example.com/docs/guide",
                "https://example.com/x",
                "https://rust-lang.org/",
            ]
        );

        let scopes: Vec<_> = links.iter().map(|l| l.scope).collect();
        assert_eq!(
            scopes,
            vec![
                LinkScope::Internal,
                LinkScope::Internal,
                LinkScope::Internal,
                LinkScope::External,
            ]
        );
    }

    #[test]
    fn test_scheme_and_port_do_not_change_scope() {
        let base = Url::parse("https://example.com/").unwrap();
        let links = classify_links(
            &base,
            &refs(&["http://example.com/a", "https://example.com:8443/b", "https://www.example.com/"]),
        );

        assert_eq!(links[0].scope, LinkScope::Internal);
        assert_eq!(links[1].scope, LinkScope::Internal);
        assert_eq!(links[2].scope, LinkScope::External);
    }

    #[test]
    fn test_unresolvable_links_are_dropped() {
        let base = Url::parse("https://example.com/").unwrap();
        let links = classify_links(&base, &refs(&["http://[::1", "/ok", "https://exa mple.com/"]));

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].raw, "/ok");
    }

    #[test]
    fn test_non_http_links_are_external() {
        let base = Url::parse("https://example.com/").unwrap();
        let links = classify_links(&base, &refs(&["mailto:someone@example.com"]));

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].scope, LinkScope::External);
    }

    #[test]
    fn test_canonicalize_query_sorts_and_encodes() {
        let mut link = Url::parse("https://example.com/search?b=2&a=hello world&a=again").unwrap();
        canonicalize_query(&mut link);
        assert_eq!(link.query(), Some("a=hello+world&a=again&b=2"));
    }

    #[test]
    fn test_canonicalize_query_leaves_plain_links_alone() {
        let mut link = Url::parse("https://example.com/path").unwrap();
        canonicalize_query(&mut link);
        assert_eq!(link.as_str(), "https://example.com/path");

        let mut empty = Url::parse("https://example.com/path?").unwrap();
        canonicalize_query(&mut empty);
        assert_eq!(empty.as_str(), "https://example.com/path");
    }

    #[tokio::test]
    async fn test_no_links_means_zero_counts() {
        let transport = Arc::new(FakeTransport::new());
        let counts = analyzer(transport.clone(), 20)
            .analyze_links(&CancellationToken::new(), "https://example.com/", &[])
            .await
            .unwrap();

        assert_eq!(counts, LinkCounts::default());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_counts_unreachable_links() {
        let transport = Arc::new(
            FakeTransport::new()
                .with_host("example.com", HostBehavior::Respond(200))
                .with_host("moved.example", HostBehavior::Respond(301))
                .with_host("missing.example", HostBehavior::Respond(404))
                .with_host("broken.example", HostBehavior::Respond(500))
                .with_host("down.example", HostBehavior::Fail),
        );

        let counts = analyzer(transport.clone(), 20)
            .analyze_links(
                &CancellationToken::new(),
                "https://example.com/",
                &refs(&[
                    "/home",
                    "https://moved.example/",
                    "https://missing.example/",
                    "https://broken.example/",
                    "https://down.example/",
                    "http://[::1",
                ]),
            )
            .await
            .unwrap();

        assert_eq!(counts.internal, 1);
        assert_eq!(counts.external, 4);
        assert_eq!(counts.unreachable, 3);
        assert!(counts.unreachable <= counts.resolved());
        assert_eq!(transport.requests().len(), 5);
        assert!(transport
            .requests()
            .iter()
            .all(|request| request.method == reqwest::Method::HEAD));
    }

    #[tokio::test]
    async fn test_non_standard_error_status_is_unreachable() {
        let transport = Arc::new(
            FakeTransport::new()
                .with_host("social.example", HostBehavior::Respond(999))
                .with_host("odd.example", HostBehavior::Respond(600))
                .with_host("fine.example", HostBehavior::Respond(204)),
        );

        let counts = analyzer(transport, 20)
            .analyze_links(
                &CancellationToken::new(),
                "https://example.com/",
                &refs(&[
                    "https://social.example/in/someone",
                    "https://odd.example/",
                    "https://fine.example/",
                ]),
            )
            .await
            .unwrap();

        assert_eq!(counts.external, 3);
        assert_eq!(counts.unreachable, 2);
    }

    #[tokio::test]
    async fn test_zero_ceiling_still_checks_every_link() {
        let transport = Arc::new(FakeTransport::new().with_host("example.com", HostBehavior::Respond(200)));
        let hrefs: Vec<String> = (0..4).map(|i| format!("/p{}", i)).collect();

        analyzer(transport.clone(), 0)
            .analyze_links(&CancellationToken::new(), "https://example.com/", &hrefs)
            .await
            .unwrap();

        assert_eq!(transport.requests().len(), 4);
        assert_eq!(transport.peak_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_internal_link_stays_internal() {
        let transport = Arc::new(FakeTransport::new().with_host("example.com", HostBehavior::Fail));

        let counts = analyzer(transport, 20)
            .analyze_links(&CancellationToken::new(), "https://example.com/", &refs(&["/a", "/b"]))
            .await
            .unwrap();

        assert_eq!(counts.internal, 2);
        assert_eq!(counts.external, 0);
        assert_eq!(counts.unreachable, 2);
    }

    #[tokio::test]
    async fn test_head_request_uses_canonical_query() {
        let transport = Arc::new(FakeTransport::new().with_host("example.com", HostBehavior::Respond(200)));

        analyzer(transport.clone(), 20)
            .analyze_links(
                &CancellationToken::new(),
                "https://example.com/",
                &refs(&["/find?q=rust lang&lang=en"]),
            )
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url.as_str(),
            "https://example.com/find?lang=en&q=rust+lang"
        );
    }

    #[tokio::test]
    async fn test_slow_link_times_out_as_unreachable() {
        let transport = Arc::new(FakeTransport::new().with_host(
            "slow.example",
            HostBehavior::Slow(Duration::from_secs(5), 200),
        ));
        let analyzer = LinkAnalyzer::new(transport, Duration::from_millis(50), 20);

        let counts = analyzer
            .analyze_links(
                &CancellationToken::new(),
                "https://example.com/",
                &refs(&["https://slow.example/"]),
            )
            .await
            .unwrap();

        assert_eq!(counts.external, 1);
        assert_eq!(counts.unreachable, 1);
    }

    #[tokio::test]
    async fn test_never_more_than_twenty_requests_in_flight() {
        let transport = Arc::new(FakeTransport::new().with_host(
            "example.com",
            HostBehavior::Slow(Duration::from_millis(30), 200),
        ));
        let hrefs: Vec<String> = (0..75).map(|i| format!("/page/{}", i)).collect();

        let counts = analyzer(transport.clone(), 20)
            .analyze_links(&CancellationToken::new(), "https://example.com/", &hrefs)
            .await
            .unwrap();

        assert_eq!(counts.internal, 75);
        assert_eq!(counts.unreachable, 0);
        assert_eq!(transport.requests().len(), 75);
        assert!(transport.peak_in_flight() <= 20);
        assert!(transport.peak_in_flight() > 1);
    }

    #[tokio::test]
    async fn test_custom_ceiling_is_respected() {
        let transport = Arc::new(FakeTransport::new().with_host(
            "example.com",
            HostBehavior::Slow(Duration::from_millis(20), 200),
        ));
        let hrefs: Vec<String> = (0..12).map(|i| format!("/p{}", i)).collect();

        analyzer(transport.clone(), 3)
            .analyze_links(&CancellationToken::new(), "https://example.com/", &hrefs)
            .await
            .unwrap();

        assert!(transport.peak_in_flight() <= 3);
        assert_eq!(transport.requests().len(), 12);
    }

    #[tokio::test]
    async fn test_cancellation_unblocks_waiting_links() {
        let transport = Arc::new(FakeTransport::new().with_host(
            "example.com",
            HostBehavior::Slow(Duration::from_secs(30), 200),
        ));
        let hrefs: Vec<String> = (0..10).map(|i| format!("/p{}", i)).collect();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let analyzer = LinkAnalyzer::new(transport.clone(), Duration::from_secs(60), 2);
        let started = std::time::Instant::now();
        let counts = analyzer
            .analyze_links(&cancel, "https://example.com/", &hrefs)
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(counts.internal, 10);
        assert_eq!(counts.unreachable, 0);
        // Only the first two ever got a slot.
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_base_url_is_an_error() {
        let transport = Arc::new(FakeTransport::new());
        let result = analyzer(transport, 20)
            .analyze_links(&CancellationToken::new(), "/relative/only", &refs(&["/a"]))
            .await;

        assert!(matches!(result, Err(AnalyzeError::InvalidUrl { .. })));
    }
}
