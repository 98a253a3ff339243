// src/transport/fake.rs
// =============================================================================
// A scripted HttpTransport for tests.
//
// Behaviour is chosen by the request's host name:
// - a host mapped to `Respond` answers with that status
// - a host mapped to `Fail` fails like an unreachable server
// - a host mapped to `Slow` sleeps first, then answers
// - any other host goes to the fallback transport if one is set, else fails
//
// It also records every request and tracks how many calls were in flight at
// once, which is how the admission ceiling is verified.
// =============================================================================

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{HttpRequest, HttpResponse, HttpTransport};
use crate::error::TransportError;

#[derive(Debug, Clone, Copy)]
pub enum HostBehavior {
    Respond(u16),
    Fail,
    Slow(Duration, u16),
}

#[derive(Default)]
pub struct FakeTransport {
    hosts: HashMap<String, HostBehavior>,
    fallback: Option<Arc<dyn HttpTransport>>,
    requests: Mutex<Vec<HttpRequest>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: &str, behavior: HostBehavior) -> Self {
        self.hosts.insert(host.to_string(), behavior);
        self
    }

    pub fn with_fallback(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.fallback = Some(transport);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

// Decrements the in-flight counter even when the caller drops our future.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        // Record the request before anything can fail
        self.requests.lock().unwrap().push(request.clone());

        // Count ourselves in and remember the highest count ever seen.
        // The guard counts us out again when this future finishes or is
        // dropped (timeout, cancellation)
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        // Look up the scripted behaviour for this host
        let host = request.url.host_str().unwrap_or_default().to_string();
        match self.hosts.get(&host).copied() {
            Some(HostBehavior::Respond(status)) => Ok(respond(status)),
            Some(HostBehavior::Slow(delay, status)) => {
                tokio::time::sleep(delay).await;
                Ok(respond(status))
            }
            Some(HostBehavior::Fail) => Err(unreachable_host(&host)),
            None => match &self.fallback {
                Some(fallback) => fallback.execute(request).await,
                None => Err(unreachable_host(&host)),
            },
        }
    }
}

// A response with the given status and an empty body.
// StatusCode accepts 100..=999; anything else falls back to 500
fn respond(status: u16) -> HttpResponse {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::new(status, stream::empty().boxed())
}

fn unreachable_host(host: &str) -> TransportError {
    TransportError::Connect(format!("host {} is unreachable", host))
}
