//! Retry policy for outbound requests.
//!
//! Implements linear backoff: after the failed attempt with index `i`
//! (0-based) the client waits `(i + 1) * backoff_step`.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Backoff unit, multiplied by the attempt number.
    pub backoff_step: Duration,
}

impl RetryPolicy {
    /// Backoff to apply after the attempt with the given 0-based index failed.
    pub fn backoff_for(&self, attempt_index: u32) -> Duration {
        self.backoff_step * (attempt_index + 1)
    }

    /// Whether another attempt may follow the one with the given index.
    pub fn has_attempts_left(&self, attempt_index: u32) -> bool {
        attempt_index + 1 < self.max_attempts
    }

    /// 429 and every 5xx are transient. Everything else goes back to the caller.
    pub fn is_retryable_status(status: u16) -> bool {
        status == 429 || (500..=599).contains(&status)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_secs(1),
        }
    }
}
