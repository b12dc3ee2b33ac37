//! Retry and backoff policy.
//!
//! This module encapsulates failure classification (network, timeouts,
//! server and client errors) and exponential backoff decisions so that the
//! API client shares one consistent policy for submissions and status polls.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{FailureClass, RetryDecision, RetryPolicy};
pub use run::send_with_retry;
