//! Terminal poll failures and the full error taxonomy exposed to callers.

use super::normalize::{CanonicalError, ErrorKind};
use crate::model::JobHandle;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Every failure kind a caller may observe, transport-level or lifecycle-level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    Timeout,
    ServerError,
    ClientError,
    Protocol,
    Unknown,
    /// The poll budget ran out before the job reached a terminal state.
    TimedOut,
    /// The caller stopped observing the job.
    Cancelled,
    /// The backend reported the job itself as failed.
    RemoteJobFailed,
}

impl From<ErrorKind> for FailureKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Network => FailureKind::Network,
            ErrorKind::Timeout => FailureKind::Timeout,
            ErrorKind::ServerError => FailureKind::ServerError,
            ErrorKind::ClientError => FailureKind::ClientError,
            ErrorKind::Protocol => FailureKind::Protocol,
            ErrorKind::Unknown => FailureKind::Unknown,
        }
    }
}

/// Which poll budget was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Budget {
    Attempts(u32),
    Elapsed(Duration),
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Budget::Attempts(n) => write!(f, "{} attempts", n),
            Budget::Elapsed(d) => write!(f, "{}s", d.as_secs()),
        }
    }
}

/// Why a poll session ended without a completed job.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PollFailure {
    #[error("job submission failed: {0}")]
    Submit(CanonicalError),
    #[error("job {job_id} failed: {message}")]
    RemoteJobFailed { job_id: JobHandle, message: String },
    #[error("job {job_id} still processing after {attempts} polls over {}s (budget: {budget})", .elapsed.as_secs())]
    TimedOut {
        job_id: JobHandle,
        attempts: u32,
        elapsed: Duration,
        budget: Budget,
    },
    #[error("polling cancelled")]
    Cancelled { job_id: Option<JobHandle> },
    #[error("poll session aborted: {0}")]
    Aborted(CanonicalError),
}

impl PollFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            PollFailure::Submit(e) | PollFailure::Aborted(e) => e.kind.into(),
            PollFailure::RemoteJobFailed { .. } => FailureKind::RemoteJobFailed,
            PollFailure::TimedOut { .. } => FailureKind::TimedOut,
            PollFailure::Cancelled { .. } => FailureKind::Cancelled,
        }
    }

    /// Whether submitting the same request again is a sensible next step.
    pub fn is_resubmittable(&self) -> bool {
        matches!(
            self.kind(),
            FailureKind::Network
                | FailureKind::Timeout
                | FailureKind::ServerError
                | FailureKind::TimedOut
                | FailureKind::RemoteJobFailed
        )
    }
}
