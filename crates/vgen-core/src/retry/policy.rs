use std::time::Duration;

/// Classification of a failed attempt for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Network-level failure (connection refused, DNS, reset).
    Connection,
    /// Attempt exceeded its timeout.
    Timeout,
    /// HTTP 5xx.
    ServerError(u16),
    /// HTTP 4xx or other non-success status.
    ClientError(u16),
    /// Anything else (bad URL, unsupported protocol, TLS failure).
    Other,
}

impl FailureClass {
    /// Transient failures are retried without caller intervention.
    pub fn is_transient(self) -> bool {
        match self {
            FailureClass::Connection => true,
            FailureClass::ServerError(status) => status >= 500,
            FailureClass::Timeout | FailureClass::ClientError(_) | FailureClass::Other => false,
        }
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Bounded exponential backoff.
///
/// The policy carries no per-call state; callers pass it to every request so
/// that status polls and submissions can use different budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each retry after that.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (1-based): base * 2^(attempt-1), capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(exp).min(self.max_delay)
    }

    /// Decide what to do after attempt number `attempt` (1-based) failed.
    pub fn decide(&self, attempt: u32, class: FailureClass) -> RetryDecision {
        if attempt > self.max_retries || !class.is_transient() {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.backoff(attempt))
    }
}
