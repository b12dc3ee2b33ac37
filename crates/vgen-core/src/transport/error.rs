//! Transport failure type.

use std::time::Duration;
use thiserror::Error;

/// Longest slice of a response body kept on an error for diagnostics.
const BODY_EXCERPT_CHARS: usize = 200;

/// A single failed request. Only `Network` and 5xx `ServerError` are transient.
/// `Request` covers failures that will not go away by resending: an
/// unsupported scheme, a malformed URL, a TLS handshake or certificate error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection, DNS, send/receive failure; no HTTP status was obtained.
    #[error("network error: {0}")]
    Network(String),
    /// The request did not finish within its timeout.
    #[error("request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
    /// HTTP 5xx.
    #[error("server error: HTTP {status}")]
    ServerError { status: u16, body: String },
    /// HTTP 4xx (and any other non-2xx that is not a server error).
    #[error("client error: HTTP {status}")]
    ClientError { status: u16, body: String },
    /// The request could not be performed at all.
    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Error for a non-2xx status, or `None` when the status is a success.
    pub fn from_status(status: u16, body: &[u8]) -> Option<Self> {
        if (200..300).contains(&status) {
            return None;
        }
        let body = excerpt(body);
        Some(if status >= 500 {
            TransportError::ServerError { status, body }
        } else {
            TransportError::ClientError { status, body }
        })
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::ServerError { status, .. }
            | TransportError::ClientError { status, .. } => Some(*status),
            TransportError::Network(_)
            | TransportError::Timeout(_)
            | TransportError::Request(_) => None,
        }
    }
}

fn excerpt(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(BODY_EXCERPT_CHARS)
        .collect()
}
