//! Scripted upstream used by unit tests.

use crate::http::{HttpTransport, RateLimitedClient, RawResponse, RequestThrottle, RetryPolicy, TransportError};
use crate::ygoprodeck::CatalogFetcher;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const TEST_BASE_URL: &str = "http://upstream.test/api/v7";

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub url: String,
    pub query: Vec<(String, String)>,
}

#[derive(Default)]
struct State {
    version: VecDeque<Result<RawResponse, TransportError>>,
    catalog: VecDeque<Result<RawResponse, TransportError>>,
    calls: Vec<RecordedCall>,
}

/// Answers `checkDBVer.php` and `cardinfo.php` from separate queues.
/// An exhausted queue answers 404.
#[derive(Clone, Default)]
pub(crate) struct FakeUpstream {
    state: Arc<Mutex<State>>,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_version_json(&self, value: serde_json::Value) {
        self.push_version_status(200, &value.to_string());
    }

    pub fn push_version_status(&self, status: u16, body: &str) {
        self.state
            .lock()
            .unwrap()
            .version
            .push_back(Ok(RawResponse::new(status, body)));
    }

    pub fn push_catalog_json(&self, value: serde_json::Value) {
        self.push_catalog_status(200, &value.to_string());
    }

    pub fn push_catalog_status(&self, status: u16, body: &str) {
        self.state
            .lock()
            .unwrap()
            .catalog
            .push_back(Ok(RawResponse::new(status, body)));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn catalog_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.url.ends_with("/cardinfo.php"))
            .count()
    }
}

impl HttpTransport for FakeUpstream {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<RawResponse, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall {
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });

        let queue = if url.ends_with("/checkDBVer.php") {
            &mut state.version
        } else {
            &mut state.catalog
        };
        queue
            .pop_front()
            .unwrap_or_else(|| Ok(RawResponse::new(404, "no scripted response")))
    }
}

/// Fetcher over `upstream` with a fast throttle and no backoff.
pub(crate) fn fetcher_for(upstream: &FakeUpstream) -> Arc<CatalogFetcher> {
    let http = RateLimitedClient::new(
        Box::new(upstream.clone()),
        Arc::new(RequestThrottle::new(1000)),
        RetryPolicy {
            max_attempts: 3,
            backoff_step: Duration::ZERO,
        },
    );
    Arc::new(CatalogFetcher::new(Arc::new(http), TEST_BASE_URL))
}
