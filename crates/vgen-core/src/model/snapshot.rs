//! Job identity and observed job state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned job identifier, returned at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobHandle {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Remote job status. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse a backend status string. Backends disagree on spelling and case,
    /// so the common synonyms are folded into the three states.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processing" | "pending" | "queued" | "queueing" | "preparing" | "running" => {
                Some(JobStatus::Processing)
            }
            "completed" | "succeeded" | "success" => Some(JobStatus::Completed),
            "failed" | "fail" | "error" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One validated observation of a job, as reported by the backend.
///
/// `progress` is whatever the server sent (if anything); the poller turns
/// this into a [`JobSnapshot`] with a definite progress value.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub id: JobHandle,
    pub status: JobStatus,
    pub progress: Option<f64>,
    pub result_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_secs: Option<f64>,
    pub error_message: Option<String>,
}

/// Job state as delivered to the caller.
///
/// Completed snapshots always carry `result_url`, failed snapshots always
/// carry `error_message`, and never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub id: JobHandle,
    pub status: JobStatus,
    /// Fraction complete in [0.0, 1.0]. Meaningless once terminal.
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobSnapshot {
    /// Build a snapshot from a validated report with the progress the caller should see.
    pub fn from_report(report: StatusReport, progress: f64) -> Self {
        Self {
            id: report.id,
            status: report.status,
            progress,
            result_url: report.result_url,
            thumbnail_url: report.thumbnail_url,
            duration_secs: report.duration_secs,
            error_message: report.error_message,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
