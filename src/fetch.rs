// src/fetch.rs
// =============================================================================
// Downloads the page we are going to analyze.
//
// Exactly one GET is sent. The call is bounded twice:
// - by its own fetch timeout (10 seconds by default)
// - by the caller's cancellation token
//
// A status >= 400 becomes AnalyzeError::Http so the user sees the server's
// own status instead of a generic "request failed". That includes the odd
// non-standard codes above 599 that some sites send (LinkedIn answers 999).
//
// Rust concepts:
// - tokio::select!: race several futures, keep the first one to finish
// - tokio::time::timeout: wrap a future so it gives up after a duration
// - map_err + ?: turn one error type into another and return early
// =============================================================================

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{AnalyzeError, TransportError};
use crate::transport::{is_error_status, HttpRequest, HttpTransport};

// Fetches `url` and returns the full response body
//
// Parameters:
//   transport: the HTTP capability (borrowed; shared with the link prober)
//   cancel: the caller's token; cancelling it abandons the download
//   url: the page to download, already validated as http(s)
//   timeout: how long the request AND the body read may take together
//
// Returns:
//   Ok(bytes) = the raw body, not decoded yet
//   Err(Http) = the server answered with a status >= 400
//   Err(Network) = no response at all, or no complete one before the timeout
//   Err(BodyRead) = the response started but the body broke off
//   Err(Cancelled) = the token fired first
pub async fn fetch_page(
    transport: &dyn HttpTransport,
    cancel: &CancellationToken,
    url: &Url,
    timeout: Duration,
) -> Result<Vec<u8>, AnalyzeError> {
    // Don't even open a connection if the caller already gave up
    if cancel.is_cancelled() {
        return Err(AnalyzeError::Cancelled {
            url: url.to_string(),
        });
    }

    log::debug!("Fetching {} (timeout {:?})", url, timeout);

    // Race the download against cancellation
    //
    // Whichever branch finishes first wins, and the other future is dropped.
    // Dropping the download future also drops the response it holds, which
    // closes the connection.
    tokio::select! {
        _ = cancel.cancelled() => Err(AnalyzeError::Cancelled {
            url: url.to_string(),
        }),
        outcome = tokio::time::timeout(timeout, get_body(transport, url)) => match outcome {
            // Finished in time: pass through whatever get_body decided
            Ok(result) => result,
            // The timer fired first. Report it as a network failure so the
            // user gets one flash message for "the page did not answer"
            Err(_) => Err(AnalyzeError::Network {
                url: url.to_string(),
                source: TransportError::Timeout(format!("no complete response within {:?}", timeout)),
            }),
        },
    }
}

// Sends the GET, checks the status, then reads the body
//
// The response is owned here; any early return drops it and releases the body.
async fn get_body(transport: &dyn HttpTransport, url: &Url) -> Result<Vec<u8>, AnalyzeError> {
    // Step 1: send the request and wait for the status line + headers
    let response = transport
        .execute(HttpRequest::get(url.clone()))
        .await
        .map_err(|source| AnalyzeError::Network {
            url: url.to_string(),
            source,
        })?;

    // Step 2: reject error statuses (anything >= 400, see is_error_status)
    // before downloading anything
    let status = response.status();
    if is_error_status(status) {
        return Err(AnalyzeError::Http {
            status: status.as_u16(),
            // e.g. "404 Not Found"; unknown codes render as
            // "999 <unknown status code>"
            description: status.to_string(),
        });
    }

    // Step 3: pull the whole body into memory
    response
        .into_bytes()
        .await
        .map_err(|source| AnalyzeError::BodyRead {
            url: url.to_string(),
            source,
        })
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why two different error variants for "it failed"?
//    - Http means the server is alive and said no (404, 500, ...)
//    - Network means we never got a usable answer (DNS, refused, timeout)
//    - The CLI uses the difference for its exit code (1 vs 2)
//
// 2. What does `&dyn HttpTransport` mean?
//    - "some type that implements HttpTransport", decided at runtime
//    - Production passes the reqwest transport, tests pass a fake
//
// 3. Why is the timeout outside get_body?
//    - So one timer covers both sending the request and reading the body
//    - A server that sends headers quickly and then stalls still times out
// -----------------------------------------------------------------------------
