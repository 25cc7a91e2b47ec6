use card_catalog_sync::http::{HttpTransport, RawResponse, TransportError, TransportErrorKind};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub at: Instant,
}

#[derive(Default)]
struct Scripts {
    version: VecDeque<Result<RawResponse, TransportError>>,
    catalog: VecDeque<Result<RawResponse, TransportError>>,
    calls: Vec<RecordedCall>,
}

/// In-process stand-in for the card API.
///
/// `checkDBVer.php` and `cardinfo.php` are served from separate queues. An
/// empty queue answers 404 so unexpected requests fail loudly.
#[derive(Clone, Default)]
pub struct FakeUpstream {
    scripts: Arc<Mutex<Scripts>>,
}

#[allow(dead_code)]
impl FakeUpstream {
    pub fn push_version(&self, value: Value) {
        self.push_version_response(200, &value.to_string());
    }

    pub fn push_version_response(&self, status: u16, body: &str) {
        self.scripts
            .lock()
            .unwrap()
            .version
            .push_back(Ok(RawResponse::new(status, body)));
    }

    pub fn push_catalog(&self, value: Value) {
        self.push_catalog_response(200, &value.to_string());
    }

    pub fn push_catalog_response(&self, status: u16, body: &str) {
        self.scripts
            .lock()
            .unwrap()
            .catalog
            .push_back(Ok(RawResponse::new(status, body)));
    }

    pub fn push_catalog_connection_failure(&self) {
        self.scripts
            .lock()
            .unwrap()
            .catalog
            .push_back(Err(TransportError::new(
                TransportErrorKind::Connect,
                "connection refused",
            )));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.scripts.lock().unwrap().calls.clone()
    }

    pub fn version_calls(&self) -> usize {
        self.count_calls("/checkDBVer.php")
    }

    pub fn catalog_calls(&self) -> usize {
        self.count_calls("/cardinfo.php")
    }

    fn count_calls(&self, suffix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.url.ends_with(suffix))
            .count()
    }
}

impl HttpTransport for FakeUpstream {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<RawResponse, TransportError> {
        let mut scripts = self.scripts.lock().unwrap();
        scripts.calls.push(RecordedCall {
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            at: Instant::now(),
        });

        let queue = if url.ends_with("/checkDBVer.php") {
            &mut scripts.version
        } else if url.ends_with("/cardinfo.php") {
            &mut scripts.catalog
        } else {
            return Ok(RawResponse::new(404, "unknown endpoint"));
        };
        queue
            .pop_front()
            .unwrap_or_else(|| Ok(RawResponse::new(404, "no scripted response")))
    }
}
