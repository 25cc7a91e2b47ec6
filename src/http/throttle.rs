//! Minimum-interval throttling for outbound requests.
//!
//! The upstream API allows 20 requests per second and bans offenders for an
//! hour. We stay well below that and share a single throttle between every
//! caller in the process.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default request ceiling.
pub const DEFAULT_MAX_REQUESTS_PER_SEC: u32 = 5;

/// Spaces outbound requests at least `1 / max_requests_per_sec` apart.
///
/// The last-request timestamp comes from the monotonic clock. Share the
/// throttle through an `Arc` so that unrelated call sites serialize against
/// the same timestamp. Across processes this is best-effort only.
#[derive(Debug)]
pub struct RequestThrottle {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    /// Create a throttle allowing at most `max_requests_per_sec` requests per second.
    pub fn new(max_requests_per_sec: u32) -> Self {
        let per_sec = max_requests_per_sec.max(1);
        Self {
            min_interval: Duration::from_secs(1) / per_sec,
            last_request: Mutex::new(None),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS_PER_SEC)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until the next request may go out, then claim the slot.
    ///
    /// The lock stays held while sleeping, so concurrent callers queue behind
    /// each other. Returns the instant recorded for this request.
    pub fn acquire(&self) -> Instant {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!("Throttling outbound request for {:?}", wait);
                std::thread::sleep(wait);
            }
        }

        let now = Instant::now();
        *last = Some(now);
        now
    }
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::with_defaults()
    }
}
