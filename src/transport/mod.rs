// src/transport/mod.rs
// =============================================================================
// The HTTP capability everything else is built on.
//
// The fetcher and the link prober never talk to reqwest directly. They take an
// `Arc<dyn HttpTransport>`, so tests can swap in a fake that answers per host
// name without touching the network.
//
// Submodules:
// - client: the production transport, backed by reqwest
// - fake: a scripted transport for tests
// =============================================================================

mod client;
#[cfg(test)]
pub mod fake;

pub use client::ReqwestTransport;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::{Method, StatusCode};
use std::fmt;
use url::Url;

use crate::error::TransportError;

/// A request the transport should send. No body, ever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
        }
    }

    /// A probe: headers only, no body download.
    pub fn head(url: Url) -> Self {
        Self {
            method: Method::HEAD,
            url,
        }
    }
}

/// Status plus a lazily read body.
///
/// The body is a stream owned by this value. Dropping the response closes
/// the stream and hands the connection back, whichever path we leave on.
pub struct HttpResponse {
    status: StatusCode,
    body: BoxStream<'static, Result<Vec<u8>, TransportError>>,
}

impl HttpResponse {
    pub fn new(
        status: StatusCode,
        body: BoxStream<'static, Result<Vec<u8>, TransportError>>,
    ) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Reads the whole body into memory.
    ///
    /// Takes `self` by value: once the body is read the response is used up.
    pub async fn into_bytes(mut self) -> Result<Vec<u8>, TransportError> {
        let mut buffer = Vec::new();
        // next() yields Some(chunk) until the stream ends, then None.
        // A chunk error stops the loop and is returned by `?`
        while let Some(chunk) = self.body.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

// Decides whether a status counts as a failure
//
// Every status from 400 upwards does, standard or not. StatusCode's own
// is_client_error() / is_server_error() stop at 599, but servers may send
// anything up to 999 (LinkedIn answers bots with 999).
pub fn is_error_status(status: StatusCode) -> bool {
    status.as_u16() >= 400
}

/// Sends one request and returns the response head.
///
/// Implementations must not follow the returned status (a 404 is a normal
/// `Ok`); only failures to get a response at all are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why #[async_trait]?
//    - `async fn` in a trait used as `dyn HttpTransport` needs its future
//      boxed; the async_trait macro writes that boxing for us
//
// 2. Why Send + Sync on the trait?
//    - The transport is shared through an Arc by tasks on several threads
//    - Send: can be moved to another thread; Sync: can be used from several
//
// 3. What is a BoxStream?
//    - A heap-allocated stream with its concrete type hidden
//    - Lets the real client and the test fake return the same type
// -----------------------------------------------------------------------------
