//! JSON payloads exchanged with the backend, and their validation into
//! domain types.

use super::error::ProtocolError;
use crate::model::{JobHandle, JobStatus, StatusReport};
use serde::{Deserialize, Serialize};

/// Message used when the backend reports a failure without saying why.
pub const DEFAULT_FAILURE_MESSAGE: &str = "generation failed without an error message";

/// Response of `POST /generate-video`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubmitPayload {
    #[serde(default, alias = "video_id")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "video_url")]
    pub result_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Acknowledgement of an accepted job.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    pub job_id: JobHandle,
    /// Status echoed at submission, if the backend sent a recognised one.
    pub status: Option<JobStatus>,
    pub result_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_secs: Option<f64>,
}

impl SubmitPayload {
    pub fn into_receipt(self) -> Result<SubmitReceipt, ProtocolError> {
        let job_id = non_empty(self.job_id).ok_or(ProtocolError::MissingJobId)?;
        Ok(SubmitReceipt {
            job_id: JobHandle::new(job_id),
            status: self.status.as_deref().and_then(JobStatus::parse),
            result_url: non_empty(self.result_url),
            thumbnail_url: non_empty(self.thumbnail_url),
            duration_secs: self.duration,
        })
    }
}

/// Response of `GET /video-status/{job_id}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StatusPayload {
    #[serde(default, alias = "job_id")]
    pub video_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default, alias = "result_url")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default, alias = "error_message")]
    pub error: Option<String>,
}

impl StatusPayload {
    /// Validate against the snapshot rules: completed needs a URL, failed
    /// needs a message, and the field the status does not allow is dropped.
    /// `requested` is used when the payload omits its own id.
    pub fn into_report(self, requested: &JobHandle) -> Result<StatusReport, ProtocolError> {
        let status =
            JobStatus::parse(&self.status).ok_or(ProtocolError::UnknownStatus(self.status))?;
        let id = non_empty(self.video_id)
            .map(JobHandle::new)
            .unwrap_or_else(|| requested.clone());
        let mut result_url = non_empty(self.video_url);
        let mut error_message = non_empty(self.error);

        match status {
            JobStatus::Completed => {
                if result_url.is_none() {
                    return Err(ProtocolError::MissingResultUrl(id));
                }
                error_message = None;
            }
            JobStatus::Failed => {
                result_url = None;
                error_message =
                    Some(error_message.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()));
            }
            JobStatus::Processing => {
                result_url = None;
                error_message = None;
            }
        }

        Ok(StatusReport {
            id,
            status,
            progress: self.progress,
            result_url,
            thumbnail_url: non_empty(self.thumbnail_url),
            duration_secs: self.duration,
            error_message,
        })
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl HealthReport {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Response of `GET /videos/{job_id}` for a completed video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub video_id: String,
    pub video_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    pub status: String,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}
