//! Integration test: curl transport against a scripted local backend.
//!
//! Starts a minimal HTTP server, submits a job through the real client stack
//! and polls it to a terminal state.

mod common;

use std::sync::Arc;
use std::time::Duration;
use vgen_core::api::{ApiError, BackendClient, Timeouts};
use vgen_core::error::{normalize, ErrorKind};
use vgen_core::model::{GenerationOptions, GenerationRequest, JobHandle, SourceRef};
use vgen_core::poller::{Outcome, PollConfig, PollEvent, Poller};
use vgen_core::retry::RetryPolicy;
use vgen_core::transport::{CurlTransport, TransportError};

fn client(base_url: &str) -> BackendClient<CurlTransport> {
    let timeouts = Timeouts {
        submit: Duration::from_secs(5),
        status: Duration::from_secs(5),
    };
    BackendClient::new(CurlTransport::new(Duration::from_secs(2)), base_url, timeouts)
        .expect("client")
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
    }
}

fn fast_poll() -> PollConfig {
    PollConfig {
        poll_interval: Duration::from_millis(20),
        initial_delay: Duration::ZERO,
        max_attempts: 10,
        max_elapsed: Some(Duration::from_secs(10)),
        expected_duration: Duration::from_secs(120),
        retry: fast_retry(),
    }
}

fn request() -> GenerationRequest {
    GenerationRequest::new(
        SourceRef::new("post-42", "cat vs cucumber", "https://img.example/42.jpg"),
        GenerationOptions::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn generate_polls_to_completion() {
    let server = common::backend_server::start(vec![
        (
            "POST",
            "/api/generate-video",
            vec![(
                200,
                r#"{"job_id":"abc","status":"processing","message":"Video generation started"}"#,
            )],
        ),
        (
            "GET",
            "/api/video-status/abc",
            vec![
                (200, r#"{"video_id":"abc","status":"PROCESSING","progress":0.4}"#),
                (
                    200,
                    r#"{"video_id":"abc","status":"completed","video_url":"https://x/y.mp4","duration":30}"#,
                ),
            ],
        ),
    ]);

    let poller = Poller::new(Arc::new(client(server.base_url())), fast_poll());
    let mut session = poller.start(request());

    let mut events = Vec::new();
    while let Some(event) = session.next_event().await {
        events.push(event);
    }
    assert_eq!(events.len(), 2, "events: {:?}", events);
    assert!(matches!(&events[0], PollEvent::Snapshot(s) if s.progress == 0.4));
    match &events[1] {
        PollEvent::Finished(Outcome::Completed(snapshot)) => {
            assert_eq!(snapshot.id.as_str(), "abc");
            assert_eq!(snapshot.result_url.as_deref(), Some("https://x/y.mp4"));
            assert_eq!(snapshot.duration_secs, Some(30.0));
        }
        other => panic!("unexpected terminal event {:?}", other),
    }

    let submitted = server
        .hits()
        .into_iter()
        .find(|h| h.method == "POST")
        .expect("submission reached the server");
    let body: serde_json::Value = serde_json::from_str(&submitted.body).unwrap();
    assert_eq!(body["post_id"], "post-42");
    assert_eq!(body["duration"], 30);
    assert_eq!(body["style"], "comedy");
}

#[tokio::test]
async fn unavailable_backend_is_retried() {
    let server = common::backend_server::start(vec![(
        "GET",
        "/api/video-status/abc",
        vec![
            (503, r#"{"detail":"busy"}"#),
            (503, r#"{"detail":"busy"}"#),
            (
                200,
                r#"{"video_id":"abc","status":"SUCCEEDED","video_url":"https://x/y.mp4"}"#,
            ),
        ],
    )]);

    let poller = Poller::new(Arc::new(client(server.base_url())), fast_poll());
    let mut session = poller.attach(JobHandle::from("abc"));
    let first = session.next_event().await.expect("an event");
    assert!(
        matches!(first, PollEvent::Finished(Outcome::Completed(_))),
        "retries should hide the 503s: {:?}",
        first
    );
    assert_eq!(server.hits_on("/api/video-status/abc"), 3);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = common::backend_server::start(vec![]);
    let c = client(server.base_url());

    let err = c
        .job_status(&JobHandle::from("missing"), &fast_retry())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::Transport(TransportError::ClientError { status: 404, .. })
    ));
    assert_eq!(normalize(&err).kind, ErrorKind::ClientError);
    assert_eq!(server.hits_on("/api/video-status/missing"), 1);

    let video = c
        .completed_video(&JobHandle::from("missing"), &fast_retry())
        .await
        .unwrap();
    assert!(video.is_none());
}

#[tokio::test]
async fn remote_failure_is_reported() {
    let server = common::backend_server::start(vec![(
        "GET",
        "/api/video-status/abc",
        vec![(
            200,
            r#"{"video_id":"abc","status":"FAILED","error":"no faces found"}"#,
        )],
    )]);

    let poller = Poller::new(Arc::new(client(server.base_url())), fast_poll());
    let outcome = poller.attach(JobHandle::from("abc")).wait().await;
    match outcome {
        Outcome::Failed(snapshot) => {
            assert_eq!(snapshot.error_message.as_deref(), Some("no faces found"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn health_check() {
    let server = common::backend_server::start(vec![(
        "GET",
        "/api/health",
        vec![(200, r#"{"status":"ok","message":"AI Video Generator API is running"}"#)],
    )]);
    let report = client(server.base_url())
        .health(&RetryPolicy::none())
        .await
        .unwrap();
    assert!(report.is_ok());
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let c = client(&common::backend_server::dead_url());
    let err = c
        .job_status(&JobHandle::from("abc"), &RetryPolicy::none())
        .await
        .unwrap_err();
    let canonical = normalize(&err);
    assert_eq!(canonical.kind, ErrorKind::Network);
    assert_eq!(canonical.message, "could not reach the generation service");
}

#[tokio::test]
async fn unreachable_backend_fails_submission() {
    let poller = Poller::new(
        Arc::new(client(&common::backend_server::dead_url())),
        PollConfig {
            retry: RetryPolicy::none(),
            ..fast_poll()
        },
    );
    let outcome = poller.start(request()).wait().await;
    match outcome {
        Outcome::SubmitFailed(e) => assert_eq!(e.kind, ErrorKind::Network),
        other => panic!("unexpected outcome {:?}", other),
    }
}
