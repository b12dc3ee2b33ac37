//! Progress estimation for jobs whose backend does not report a fraction.
//!
//! The estimate is a display aid only; poll budgets never look at it.

use std::time::Duration;

/// Highest value an estimate can reach. A job that is still processing must
/// never look finished before its terminal snapshot arrives.
pub const ESTIMATE_CAP: f64 = 0.95;

/// Elapsed-time based progress estimate against a fixed expected duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEstimator {
    expected_duration_secs: f64,
}

impl ProgressEstimator {
    pub fn new(expected_duration: Duration) -> Self {
        Self {
            expected_duration_secs: expected_duration.as_secs_f64(),
        }
    }

    /// Server-reported progress wins unchanged; otherwise
    /// `min(ESTIMATE_CAP, elapsed / expected)`.
    pub fn estimate(&self, elapsed_secs: f64, reported: Option<f64>) -> f64 {
        if let Some(p) = reported {
            return p;
        }
        if elapsed_secs.is_nan() || elapsed_secs <= 0.0 {
            return 0.0;
        }
        if self.expected_duration_secs <= 0.0 {
            return ESTIMATE_CAP;
        }
        (elapsed_secs / self.expected_duration_secs).min(ESTIMATE_CAP)
    }
}
