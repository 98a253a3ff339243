// src/error.rs
// =============================================================================
// Error types for the whole application.
//
// - TransportError: something went wrong talking to a host (page or link)
// - AnalyzeError: why a page report could not be produced
// - InitializationError: the logger or HTTP client could not be set up
//
// We use `thiserror` so each variant gets a Display message and `?` can
// convert between types via #[from]. Callers match on AnalyzeError to tell an
// upstream HTTP status apart from a plain network failure.
// =============================================================================

use log::SetLoggerError;
use thiserror::Error;

/// Failures reported by an [`HttpTransport`](crate::transport::HttpTransport).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        let message = error.to_string();

        if error.is_timeout() {
            TransportError::Timeout(message)
        } else if error.is_connect() {
            TransportError::Connect(message)
        } else if error.is_body() || error.is_decode() {
            TransportError::Body(message)
        } else {
            TransportError::Request(message)
        }
    }
}

/// Why a page report could not be produced.
///
/// Link-level problems never show up here; they only lower the link counts.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The page itself answered with a status >= 400.
    #[error("{description}")]
    Http { status: u16, description: String },

    #[error("reading body of {url}: {source}")]
    BodyRead {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("parsing HTML: {0}")]
    Parse(String),

    #[error("analysis of {url} was cancelled")]
    Cancelled { url: String },
}

impl AnalyzeError {
    /// Message shown to the user in place of a report.
    ///
    /// HTTP errors carry the upstream status verbatim; everything else is a
    /// generic failure.
    pub fn flash_message(&self) -> String {
        match self {
            AnalyzeError::Http {
                status,
                description,
            } => format!("HTTP error: {} with http code {}", description, status),
            other => format!("Error: {}", other),
        }
    }
}

/// Error types for start-up failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum InitializationError {
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}
