// src/transport/client.rs
// =============================================================================
// The production transport: a thin wrapper around a reqwest Client.
//
// One client is built at start-up and shared by the page fetcher and every
// link probe, so connections to the same host are pooled.
//
// Timeouts are NOT configured here. The fetcher and the prober each wrap the
// call in their own tokio timeout, raced against the cancellation token.
// =============================================================================

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{redirect, Client};

use super::{HttpRequest, HttpResponse, HttpTransport};
use crate::config::InspectorConfig;
use crate::error::{InitializationError, TransportError};

/// [`HttpTransport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    // Builds the shared client from the inspector settings
    //
    // Parameters:
    //   config: supplies the User-Agent and the redirect limit
    //
    // Returns: the transport, or InitializationError if reqwest cannot set up
    // its TLS backend
    pub fn new(config: &InspectorConfig) -> Result<Self, InitializationError> {
        let client = Client::builder()
            // Some servers refuse requests without a User-Agent
            .user_agent(config.user_agent.as_str())
            // Follow redirects; a redirect loop ends as a transport error
            .redirect(redirect::Policy::limited(config.max_redirects))
            .build()?; // ? converts reqwest::Error via #[from]

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        // send() resolves once the status line and headers arrive.
        // Connection, DNS and redirect failures come back as reqwest::Error,
        // which `?` turns into TransportError
        let response = self
            .client
            .request(request.method, request.url)
            .send()
            .await?;

        let status = response.status();

        // Don't read the body here. Hand it over as a stream so the caller
        // decides whether to read it (fetch) or drop it unread (probe)
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(TransportError::from))
            .boxed(); // boxed() erases the concrete stream type

        Ok(HttpResponse::new(status, body))
    }
}
