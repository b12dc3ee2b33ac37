use crate::retry::RetryPolicy;
use std::time::Duration;

/// Poll loop parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Delay between the end of one poll step and the start of the next.
    pub poll_interval: Duration,
    /// Delay before the first poll step after the job was accepted.
    pub initial_delay: Duration,
    /// Poll steps allowed before giving up with `TimedOut`.
    pub max_attempts: u32,
    /// Wall-clock ceiling measured from job acceptance. `None` = attempts only.
    pub max_elapsed: Option<Duration>,
    /// Baseline for the progress estimate when the backend reports none.
    pub expected_duration: Duration,
    /// Retry policy passed to every backend call made by the session.
    pub retry: RetryPolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            initial_delay: Duration::from_secs(2),
            max_attempts: 60,
            max_elapsed: Some(Duration::from_secs(600)),
            expected_duration: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}
