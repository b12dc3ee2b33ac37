//! libcurl-backed transport.
//!
//! Each attempt runs a blocking `curl::easy::Easy` transfer on tokio's
//! blocking pool, so awaiting a request never stalls the runtime.

use super::{HttpRequest, HttpResponse, Method, Transport, TransportError};
use crate::retry::{classify_curl_error, FailureClass};
use async_trait::async_trait;
use std::time::Duration;

/// Transport that performs requests with libcurl.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    connect_timeout: Duration,
}

impl CurlTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

#[async_trait]
impl Transport for CurlTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let owned = request.clone();
        let connect_timeout = self.connect_timeout;
        let (status, body) = tokio::task::spawn_blocking(move || perform(&owned, connect_timeout))
            .await
            .map_err(|e| TransportError::Network(format!("transport worker failed: {}", e)))?
            .map_err(|e| map_curl_error(&e, request.timeout))?;

        tracing::trace!(
            method = request.method.as_str(),
            url = %request.url,
            status,
            bytes = body.len(),
            "http response"
        );

        let status = u16::try_from(status).unwrap_or(u16::MAX);
        match TransportError::from_status(status, &body) {
            Some(err) => Err(err),
            None => Ok(HttpResponse { status, body }),
        }
    }
}

/// Runs one transfer in the current thread. Returns the status and full body.
fn perform(request: &HttpRequest, connect_timeout: Duration) -> Result<(u32, Vec<u8>), curl::Error> {
    let mut easy = curl::easy::Easy::new();
    easy.url(&request.url)?;
    easy.follow_location(true)?;
    easy.max_redirections(5)?;
    easy.connect_timeout(connect_timeout)?;
    easy.timeout(request.timeout)?;

    let mut list = curl::easy::List::new();
    list.append("Accept: application/json")?;
    match request.method {
        Method::Get => easy.get(true)?,
        Method::Post => {
            easy.post(true)?;
            easy.post_fields_copy(request.body.as_deref().unwrap_or_default())?;
            list.append("Content-Type: application/json")?;
            // Send the body right away instead of waiting for 100-continue.
            list.append("Expect:")?;
        }
    }
    easy.http_headers(list)?;

    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    Ok((code, body))
}

fn map_curl_error(e: &curl::Error, timeout: Duration) -> TransportError {
    match classify_curl_error(e) {
        FailureClass::Timeout => TransportError::Timeout(timeout),
        FailureClass::Connection => TransportError::Network(e.to_string()),
        _ => TransportError::Request(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{send_with_retry, RetryPolicy};

    #[test]
    fn curl_errors_map_by_class() {
        let t = Duration::from_secs(10);
        assert_eq!(
            map_curl_error(&curl::Error::new(28), t),
            TransportError::Timeout(t)
        );
        assert!(matches!(
            map_curl_error(&curl::Error::new(7), t),
            TransportError::Network(_)
        ));
        assert!(matches!(
            map_curl_error(&curl::Error::new(1), t),
            TransportError::Request(_)
        ));
    }

    #[tokio::test]
    async fn unsupported_scheme_fails_without_retrying() {
        let transport = CurlTransport::default();
        let request = HttpRequest::get("foo://host/api/health", Duration::from_secs(5));
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(60),
        };
        // A retry would sleep a full minute; the test would hang.
        let err = tokio::time::timeout(
            Duration::from_secs(30),
            send_with_retry(&transport, &request, &policy),
        )
        .await
        .expect("permanent failure must not back off")
        .unwrap_err();
        assert!(matches!(err, TransportError::Request(_)), "{:?}", err);
    }
}
