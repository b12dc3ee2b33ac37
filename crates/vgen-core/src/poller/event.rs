//! What a poll session reports to its caller.

use super::machine::PollState;
use crate::error::{Budget, CanonicalError, PollFailure};
use crate::model::{JobHandle, JobSnapshot};
use std::time::Duration;

/// One event delivered by a poll session, in poll order.
/// Exactly one `Finished` is delivered per session, and it is always last.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// The job is still processing.
    Snapshot(JobSnapshot),
    /// A status query failed after transport retries. The job may still be
    /// running; polling continues.
    QueryFailed { attempt: u32, error: CanonicalError },
    /// The session ended.
    Finished(Outcome),
}

impl PollEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollEvent::Finished(_))
    }
}

/// How a poll session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Terminal completed snapshot; carries the result URL.
    Completed(JobSnapshot),
    /// Terminal failed snapshot from the backend; carries the error message.
    Failed(JobSnapshot),
    /// The job was never accepted.
    SubmitFailed(CanonicalError),
    /// The poll budget ran out while the job was still processing.
    TimedOut {
        job_id: JobHandle,
        attempts: u32,
        elapsed: Duration,
        budget: Budget,
    },
    /// The caller stopped observing. The remote job is not affected.
    Cancelled { job_id: Option<JobHandle> },
    /// The session's driver task stopped before reaching a terminal state.
    Aborted(CanonicalError),
}

impl Outcome {
    /// Terminal machine state this outcome corresponds to.
    pub fn state(&self) -> PollState {
        match self {
            Outcome::Completed(_) => PollState::Completed,
            Outcome::Failed(_) | Outcome::SubmitFailed(_) | Outcome::Aborted(_) => {
                PollState::Failed
            }
            Outcome::TimedOut { .. } => PollState::TimedOut,
            Outcome::Cancelled { .. } => PollState::Cancelled,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    /// The completed snapshot, or the failure with its structured kind.
    pub fn into_result(self) -> Result<JobSnapshot, PollFailure> {
        match self {
            Outcome::Completed(snapshot) => Ok(snapshot),
            Outcome::Failed(snapshot) => Err(PollFailure::RemoteJobFailed {
                message: snapshot
                    .error_message
                    .unwrap_or_else(|| crate::api::DEFAULT_FAILURE_MESSAGE.to_string()),
                job_id: snapshot.id,
            }),
            Outcome::SubmitFailed(error) => Err(PollFailure::Submit(error)),
            Outcome::TimedOut {
                job_id,
                attempts,
                elapsed,
                budget,
            } => Err(PollFailure::TimedOut {
                job_id,
                attempts,
                elapsed,
                budget,
            }),
            Outcome::Cancelled { job_id } => Err(PollFailure::Cancelled { job_id }),
            Outcome::Aborted(error) => Err(PollFailure::Aborted(error)),
        }
    }
}
