use super::constants::FAST_RATE;
use super::upstream::FakeUpstream;
use card_catalog_sync::catalog_store::{CatalogFamily, SqliteCardStore};
use card_catalog_sync::http::{RateLimitedClient, RequestThrottle, RetryPolicy};
use card_catalog_sync::sync::{marker_file_name, Locale, MarkerStore, SyncJob};
use card_catalog_sync::ygoprodeck::CatalogFetcher;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const TEST_BASE_URL: &str = "http://cards.test/api/v7";

/// A temp dir holding `catalog.db` and the version markers, plus a scripted
/// upstream behind a real throttle and retry client.
pub struct TestEnv {
    pub dir: TempDir,
    pub store: Arc<SqliteCardStore>,
    pub upstream: FakeUpstream,
    pub fetcher: Arc<CatalogFetcher>,
    pub throttle: Arc<RequestThrottle>,
}

#[allow(dead_code)]
impl TestEnv {
    pub fn new() -> Self {
        Self::with_rate(FAST_RATE)
    }

    pub fn with_rate(max_requests_per_sec: u32) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteCardStore::open(dir.path().join("catalog.db")).unwrap());
        let upstream = FakeUpstream::default();
        let throttle = Arc::new(RequestThrottle::new(max_requests_per_sec));
        let http = RateLimitedClient::new(
            Box::new(upstream.clone()),
            throttle.clone(),
            RetryPolicy {
                max_attempts: 3,
                backoff_step: Duration::ZERO,
            },
        );
        let fetcher = Arc::new(CatalogFetcher::new(Arc::new(http), TEST_BASE_URL));

        TestEnv {
            dir,
            store,
            upstream,
            fetcher,
            throttle,
        }
    }

    pub fn markers(&self) -> MarkerStore {
        MarkerStore::new(self.dir.path())
    }

    pub fn job(&self, locale: Locale) -> SyncJob {
        self.job_with_markers(locale, self.markers())
    }

    pub fn job_with_markers(&self, locale: Locale, markers: MarkerStore) -> SyncJob {
        SyncJob::new(locale, self.fetcher.clone(), self.store.clone(), markers)
    }

    pub fn marker_path(&self, family: CatalogFamily) -> PathBuf {
        self.dir.path().join(marker_file_name(family))
    }

    pub fn marker_json(&self, family: CatalogFamily) -> Option<serde_json::Value> {
        let text = std::fs::read_to_string(self.marker_path(family)).ok()?;
        serde_json::from_str(&text).ok()
    }
}
