//! Outbound HTTP for upstream catalog calls.
//!
//! Every request goes through a [`RateLimitedClient`], which enforces a
//! process-wide minimum interval between requests and retries transient
//! failures with linear backoff.

mod client;
mod retry_policy;
mod throttle;
mod transport;

pub use client::{NetworkError, RateLimitedClient};
pub use retry_policy::RetryPolicy;
pub use throttle::{RequestThrottle, DEFAULT_MAX_REQUESTS_PER_SEC};
pub use transport::{
    HttpTransport, RawResponse, ReqwestTransport, TransportError, TransportErrorKind,
    TransportSettings,
};
