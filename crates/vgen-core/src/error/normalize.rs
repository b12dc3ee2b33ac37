//! Canonical error shape and the normalizer that produces it.
//!
//! Callers never match on transport or decoding internals; everything is
//! funnelled through [`normalize`] into a [`CanonicalError`].

use crate::api::{ApiError, ProtocolError};
use crate::retry::{classify_curl_error, FailureClass};
use crate::transport::TransportError;
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;

/// Structured kind of a normalized failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Timeout,
    ServerError,
    ClientError,
    /// The backend answered with something we could not interpret.
    Protocol,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ServerError => "server_error",
            ErrorKind::ClientError => "client_error",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure in the shape every caller consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalError {
    pub kind: ErrorKind,
    /// Human-readable summary, safe to show to an end user.
    pub message: String,
    /// Underlying error text (and response body excerpt when there was one).
    pub detail: Option<String>,
}

impl CanonicalError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail,
        }
    }
}

impl fmt::Display for CanonicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({})", self.message, detail),
            None => f.write_str(&self.message),
        }
    }
}

impl StdError for CanonicalError {}

/// Map any error to exactly one [`ErrorKind`].
///
/// Walks the `source()` chain looking for a type we know; anything else ends
/// up as `Unknown`. Never fails and performs no I/O.
pub fn normalize(raw: &(dyn StdError + 'static)) -> CanonicalError {
    let mut current: Option<&(dyn StdError + 'static)> = Some(raw);
    while let Some(err) = current {
        if let Some(found) = known(err) {
            return found;
        }
        current = err.source();
    }
    CanonicalError::new(ErrorKind::Unknown, "unexpected error", Some(raw.to_string()))
}

/// Normalize an `anyhow::Error` through its cause chain.
pub fn normalize_anyhow(err: &anyhow::Error) -> CanonicalError {
    let raw: &(dyn StdError + 'static) = err.as_ref();
    normalize(raw)
}

fn known(err: &(dyn StdError + 'static)) -> Option<CanonicalError> {
    if let Some(e) = err.downcast_ref::<CanonicalError>() {
        return Some(e.clone());
    }
    if let Some(e) = err.downcast_ref::<ApiError>() {
        return Some(from_api(e));
    }
    if let Some(e) = err.downcast_ref::<TransportError>() {
        return Some(from_transport(e));
    }
    if let Some(e) = err.downcast_ref::<ProtocolError>() {
        return Some(protocol(e));
    }
    if let Some(e) = err.downcast_ref::<serde_json::Error>() {
        return Some(protocol(e));
    }
    if let Some(e) = err.downcast_ref::<curl::Error>() {
        return Some(match classify_curl_error(e) {
            FailureClass::Timeout => timeout(e),
            FailureClass::Connection => network(e),
            _ => unusable_request(e),
        });
    }
    if let Some(e) = err.downcast_ref::<std::io::Error>() {
        return Some(if e.kind() == std::io::ErrorKind::TimedOut {
            timeout(e)
        } else {
            network(e)
        });
    }
    None
}

fn from_api(e: &ApiError) -> CanonicalError {
    match e {
        ApiError::Transport(t) => from_transport(t),
        ApiError::Protocol(p) => protocol(p),
        ApiError::Encode(_) | ApiError::Interrupted(_) => CanonicalError::new(
            ErrorKind::Unknown,
            "unexpected error",
            Some(e.to_string()),
        ),
    }
}

fn from_transport(e: &TransportError) -> CanonicalError {
    match e {
        TransportError::Network(_) => network(e),
        TransportError::Timeout(_) => timeout(e),
        TransportError::Request(_) => unusable_request(e),
        TransportError::ServerError { status, body } => CanonicalError::new(
            ErrorKind::ServerError,
            format!("the generation service failed (HTTP {})", status),
            Some(with_body(e, body)),
        ),
        TransportError::ClientError { status, body } => CanonicalError::new(
            ErrorKind::ClientError,
            format!("the generation service rejected the request (HTTP {})", status),
            Some(with_body(e, body)),
        ),
    }
}

fn network(e: &dyn fmt::Display) -> CanonicalError {
    CanonicalError::new(
        ErrorKind::Network,
        "could not reach the generation service",
        Some(e.to_string()),
    )
}

fn timeout(e: &dyn fmt::Display) -> CanonicalError {
    CanonicalError::new(
        ErrorKind::Timeout,
        "the generation service did not respond in time",
        Some(e.to_string()),
    )
}

fn unusable_request(e: &dyn fmt::Display) -> CanonicalError {
    CanonicalError::new(
        ErrorKind::Unknown,
        "the request to the generation service could not be made",
        Some(e.to_string()),
    )
}

fn protocol(e: &dyn fmt::Display) -> CanonicalError {
    CanonicalError::new(
        ErrorKind::Protocol,
        "the generation service sent an unexpected response",
        Some(e.to_string()),
    )
}

fn with_body(e: &TransportError, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        e.to_string()
    } else {
        format!("{}: {}", e, body)
    }
}
