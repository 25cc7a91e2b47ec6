//! Rate-limited, retrying GET client.

use super::retry_policy::RetryPolicy;
use super::throttle::RequestThrottle;
use super::transport::{HttpTransport, RawResponse};
use std::sync::Arc;
use tracing::{debug, warn};

/// Every attempt for a request failed with a transient error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("GET {url} failed after {attempts} attempt(s): {last_failure}")]
pub struct NetworkError {
    pub url: String,
    pub attempts: u32,
    pub last_failure: String,
}

pub struct RateLimitedClient {
    transport: Box<dyn HttpTransport>,
    throttle: Arc<RequestThrottle>,
    retry_policy: RetryPolicy,
}

impl RateLimitedClient {
    pub fn new(
        transport: Box<dyn HttpTransport>,
        throttle: Arc<RequestThrottle>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            throttle,
            retry_policy,
        }
    }

    pub fn throttle(&self) -> &Arc<RequestThrottle> {
        &self.throttle
    }

    /// GET `url`, passing through the throttle before every attempt.
    ///
    /// 429, 5xx and transport failures are retried up to `max_attempts`
    /// times in total. Any other status is returned as-is, without retry.
    pub fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<RawResponse, NetworkError> {
        let max_attempts = self.retry_policy.max_attempts.max(1);
        let mut last_failure = String::new();

        for attempt in 0..max_attempts {
            self.throttle.acquire();
            debug!("GET {} (attempt {}/{})", url, attempt + 1, max_attempts);

            match self.transport.get(url, query) {
                Ok(response) if RetryPolicy::is_retryable_status(response.status) => {
                    last_failure = format!("status {}", response.status);
                }
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_failure = e.to_string();
                }
            }

            if attempt + 1 < max_attempts {
                let backoff = self.retry_policy.backoff_for(attempt);
                warn!(
                    "GET {} failed ({}), retrying in {:?}",
                    url, last_failure, backoff
                );
                std::thread::sleep(backoff);
            }
        }

        warn!(
            "GET {} giving up after {} attempt(s): {}",
            url, max_attempts, last_failure
        );
        Err(NetworkError {
            url: url.to_string(),
            attempts: max_attempts,
            last_failure,
        })
    }
}
