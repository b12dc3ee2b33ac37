//! Client for the generation backend.
//!
//! Maps the remote operations onto transport requests, decodes their JSON
//! and validates it into domain types. The poller only sees the
//! [`JobBackend`] trait, so tests can swap in a scripted backend.

mod error;
mod wire;

pub use error::{ApiError, ProtocolError};
pub use wire::{HealthReport, SubmitReceipt, VideoDetails, DEFAULT_FAILURE_MESSAGE};

use crate::model::{GenerationRequest, JobHandle, StatusReport};
use crate::retry::{send_with_retry, RetryPolicy};
use crate::transport::{HttpRequest, Transport};
use anyhow::Context;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;
use wire::{StatusPayload, SubmitPayload};

/// The two remote operations the poller depends on.
///
/// The retry policy is passed on every call; implementations keep no retry
/// state of their own.
#[async_trait]
pub trait JobBackend: Send + Sync + 'static {
    async fn submit(
        &self,
        request: &GenerationRequest,
        retry: &RetryPolicy,
    ) -> Result<SubmitReceipt, ApiError>;

    async fn status(&self, job_id: &JobHandle, retry: &RetryPolicy)
        -> Result<StatusReport, ApiError>;
}

/// Per call-class timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Submission; the backend may take minutes to acknowledge a job.
    pub submit: Duration,
    /// Status polls and the other small reads.
    pub status: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            submit: Duration::from_secs(300),
            status: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the generation backend.
#[derive(Debug, Clone)]
pub struct BackendClient<T> {
    transport: T,
    base: Url,
    timeouts: Timeouts,
}

impl<T: Transport> BackendClient<T> {
    /// `base_url` is the prefix every endpoint is joined onto
    /// (e.g. `http://localhost:8000/api`).
    pub fn new(transport: T, base_url: &str, timeouts: Timeouts) -> anyhow::Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("invalid base URL {:?}", base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("base URL {:?} must use http or https", base_url);
        }
        if base.cannot_be_a_base() {
            anyhow::bail!("base URL {:?} cannot carry endpoint paths", base_url);
        }
        Ok(Self {
            transport,
            base,
            timeouts,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for the given path segments. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> String {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.to_string()
    }

    /// `POST /generate-video`.
    pub async fn submit_job(
        &self,
        request: &GenerationRequest,
        retry: &RetryPolicy,
    ) -> Result<SubmitReceipt, ApiError> {
        let body = request.to_json().map_err(|e| ApiError::Encode(e.to_string()))?;
        let http = HttpRequest::post_json(
            self.endpoint(&["generate-video"]),
            body,
            self.timeouts.submit,
        );
        let response = send_with_retry(&self.transport, &http, retry).await?;
        let payload: SubmitPayload =
            serde_json::from_slice(&response.body).map_err(ProtocolError::from)?;
        let receipt = payload.into_receipt()?;
        tracing::info!(
            job_id = %receipt.job_id,
            post_id = %request.source().post_id,
            style = %request.options().style,
            "generation job accepted"
        );
        Ok(receipt)
    }

    /// `GET /video-status/{job_id}`.
    pub async fn job_status(
        &self,
        job_id: &JobHandle,
        retry: &RetryPolicy,
    ) -> Result<StatusReport, ApiError> {
        let http = HttpRequest::get(
            self.endpoint(&["video-status", job_id.as_str()]),
            self.timeouts.status,
        );
        let response = send_with_retry(&self.transport, &http, retry).await?;
        let payload: StatusPayload =
            serde_json::from_slice(&response.body).map_err(ProtocolError::from)?;
        Ok(payload.into_report(job_id)?)
    }

    /// `GET /health`.
    pub async fn health(&self, retry: &RetryPolicy) -> Result<HealthReport, ApiError> {
        let http = HttpRequest::get(self.endpoint(&["health"]), self.timeouts.status);
        let response = send_with_retry(&self.transport, &http, retry).await?;
        Ok(serde_json::from_slice(&response.body).map_err(ProtocolError::from)?)
    }

    /// `GET /videos/{job_id}`. `Ok(None)` when the backend does not know the
    /// job or it has not completed yet.
    pub async fn completed_video(
        &self,
        job_id: &JobHandle,
        retry: &RetryPolicy,
    ) -> Result<Option<VideoDetails>, ApiError> {
        let http = HttpRequest::get(
            self.endpoint(&["videos", job_id.as_str()]),
            self.timeouts.status,
        );
        match send_with_retry(&self.transport, &http, retry).await {
            Ok(response) => Ok(Some(
                serde_json::from_slice(&response.body).map_err(ProtocolError::from)?,
            )),
            Err(e) if e.status() == Some(404) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<T: Transport + 'static> JobBackend for BackendClient<T> {
    async fn submit(
        &self,
        request: &GenerationRequest,
        retry: &RetryPolicy,
    ) -> Result<SubmitReceipt, ApiError> {
        self.submit_job(request, retry).await
    }

    async fn status(
        &self,
        job_id: &JobHandle,
        retry: &RetryPolicy,
    ) -> Result<StatusReport, ApiError> {
        self.job_status(job_id, retry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GenerationOptions, JobStatus, SourceRef};
    use crate::transport::{HttpResponse, Method, TransportError};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records requests and answers from a script.
    #[derive(Default)]
    struct Recording {
        replies: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Recording {
        fn replying(replies: Vec<Result<HttpResponse, TransportError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl Transport for Recording {
        async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies.lock().unwrap().pop_front().expect("unscripted request")
        }
    }

    fn json(body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: 200,
            body: body.as_bytes().to_vec(),
        })
    }

    fn client(replies: Vec<Result<HttpResponse, TransportError>>) -> BackendClient<Recording> {
        BackendClient::new(
            Recording::replying(replies),
            "http://localhost:8000/api/",
            Timeouts::default(),
        )
        .unwrap()
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new(
            SourceRef::new("p1", "caption", "https://img/1.jpg"),
            GenerationOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(BackendClient::new(Recording::default(), "not a url", Timeouts::default()).is_err());
        assert!(
            BackendClient::new(Recording::default(), "mailto:a@b.c", Timeouts::default()).is_err()
        );
        assert!(
            BackendClient::new(Recording::default(), "foo://host/api", Timeouts::default())
                .is_err()
        );
        assert!(
            BackendClient::new(Recording::default(), "https://host/api", Timeouts::default())
                .is_ok()
        );
    }

    #[test]
    fn endpoints_join_and_encode() {
        let c = client(vec![]);
        assert_eq!(
            c.endpoint(&["video-status", "a b/c"]),
            "http://localhost:8000/api/video-status/a%20b%2Fc"
        );
        let c = BackendClient::new(Recording::default(), "http://h:1/api", Timeouts::default())
            .unwrap();
        assert_eq!(c.endpoint(&["health"]), "http://h:1/api/health");
    }

    #[tokio::test]
    async fn submit_posts_body_with_submit_timeout() {
        let c = client(vec![json(r#"{"job_id":"abc","status":"processing"}"#)]);
        let receipt = c.submit_job(&request(), &RetryPolicy::none()).await.unwrap();
        assert_eq!(receipt.job_id.as_str(), "abc");

        let seen = c.transport.seen.lock().unwrap();
        assert_eq!(seen[0].method, Method::Post);
        assert_eq!(seen[0].url, "http://localhost:8000/api/generate-video");
        assert_eq!(seen[0].timeout, Duration::from_secs(300));
        let body: serde_json::Value = serde_json::from_slice(seen[0].body.as_ref().unwrap()).unwrap();
        assert_eq!(body["post_id"], "p1");
    }

    #[tokio::test]
    async fn status_uses_short_timeout() {
        let c = client(vec![json(
            r#"{"video_id":"abc","status":"completed","video_url":"https://x/y.mp4"}"#,
        )]);
        let report = c
            .job_status(&JobHandle::from("abc"), &RetryPolicy::none())
            .await
            .unwrap();
        assert_eq!(report.status, JobStatus::Completed);

        let seen = c.transport.seen.lock().unwrap();
        assert_eq!(seen[0].method, Method::Get);
        assert_eq!(seen[0].url, "http://localhost:8000/api/video-status/abc");
        assert_eq!(seen[0].timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn malformed_status_is_protocol_error() {
        let c = client(vec![json("<html>oops</html>")]);
        let err = c
            .job_status(&JobHandle::from("abc"), &RetryPolicy::none())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Protocol(ProtocolError::Json(_))));
    }

    #[tokio::test]
    async fn completed_video_404_is_none() {
        let c = client(vec![Err(TransportError::ClientError {
            status: 404,
            body: String::new(),
        })]);
        let v = c
            .completed_video(&JobHandle::from("abc"), &RetryPolicy::none())
            .await
            .unwrap();
        assert!(v.is_none());
    }

    #[tokio::test]
    async fn completed_video_details() {
        let c = client(vec![json(
            r#"{"video_id":"abc","video_url":"https://x/y.mp4","thumbnail_url":null,"duration":30,"status":"completed"}"#,
        )]);
        let v = c
            .completed_video(&JobHandle::from("abc"), &RetryPolicy::none())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(v.video_url.as_deref(), Some("https://x/y.mp4"));
        assert_eq!(v.duration, Some(30.0));
    }
}
