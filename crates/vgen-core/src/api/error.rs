//! Errors raised while talking to the backend.

use crate::model::JobHandle;
use crate::transport::TransportError;
use thiserror::Error;

/// The backend answered, but not with something we can use.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown job status {0:?}")]
    UnknownStatus(String),
    #[error("job {0} reported completed without a result URL")]
    MissingResultUrl(JobHandle),
    #[error("response did not include a job id")]
    MissingJobId,
}

/// Failure of one backend operation (after transport retries).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("could not encode request: {0}")]
    Encode(String),
    /// The task running the call ended without producing a result.
    #[error("backend call interrupted: {0}")]
    Interrupted(String),
}
