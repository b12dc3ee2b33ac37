//! Retry loop: send a request until success or the policy says stop.

use super::classify;
use super::policy::{RetryDecision, RetryPolicy};
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// Sends `request` through `transport`, retrying transient failures.
/// On a retryable failure, sleeps for the backoff duration then resends the
/// identical request. The last error is returned once the policy gives up.
pub async fn send_with_retry<T>(
    transport: &T,
    request: &HttpRequest,
    policy: &RetryPolicy,
) -> Result<HttpResponse, TransportError>
where
    T: Transport + ?Sized,
{
    let mut attempt = 1u32;
    loop {
        match transport.send(request).await {
            Ok(response) => return Ok(response),
            Err(e) => match policy.decide(attempt, classify::classify(&e)) {
                RetryDecision::NoRetry => {
                    if attempt > 1 {
                        tracing::debug!(attempt, url = %request.url, "giving up: {}", e);
                    }
                    return Err(e);
                }
                RetryDecision::RetryAfter(delay) => {
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        method = request.method.as_str(),
                        url = %request.url,
                        "transient failure, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Transport that replays scripted results and records when it was called.
    struct Scripted {
        results: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl Scripted {
        fn new(results: Vec<Result<HttpResponse, TransportError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn send(&self, _request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.calls.lock().unwrap().push(Instant::now());
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .expect("transport called more often than scripted")
        }
    }

    fn ok() -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: 200,
            body: b"{}".to_vec(),
        })
    }

    fn status(code: u16) -> Result<HttpResponse, TransportError> {
        Err(TransportError::from_status(code, b"").unwrap())
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }

    fn request() -> HttpRequest {
        HttpRequest::get("http://backend/video-status/abc", Duration::from_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn retries_503_twice_then_succeeds() {
        let t = Scripted::new(vec![status(503), status(503), ok()]);
        let resp = send_with_retry(&t, &request(), &policy()).await.unwrap();
        assert_eq!(resp.status, 200);

        let calls = t.call_times();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1] - calls[0], Duration::from_millis(500));
        assert_eq!(calls[2] - calls[1], Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn client_error_surfaces_immediately() {
        let t = Scripted::new(vec![status(404)]);
        let start = Instant::now();
        let err = send_with_retry(&t, &request(), &policy()).await.unwrap_err();
        assert!(matches!(err, TransportError::ClientError { status: 404, .. }));
        assert_eq!(t.call_times().len(), 1);
        assert_eq!(Instant::now() - start, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn network_errors_exhaust_budget() {
        let t = Scripted::new(vec![
            Err(TransportError::Network("refused".into())),
            Err(TransportError::Network("refused".into())),
            Err(TransportError::Network("refused".into())),
            Err(TransportError::Network("refused".into())),
        ]);
        let start = Instant::now();
        let err = send_with_retry(&t, &request(), &policy()).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
        assert_eq!(t.call_times().len(), 4);
        // 500ms + 1s + 2s
        assert_eq!(Instant::now() - start, Duration::from_millis(3500));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_not_retried() {
        let t = Scripted::new(vec![Err(TransportError::Timeout(Duration::from_secs(10)))]);
        let err = send_with_retry(&t, &request(), &policy()).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
        assert_eq!(t.call_times().len(), 1);
    }
}
