//! Periodic sync runner.
//!
//! Each tick runs every job once, one after the other, on the blocking pool.
//! Sync jobs are synchronous and use a blocking HTTP client, so they must
//! never run directly on the async executor.

use super::job::{SyncJob, SyncOutcome};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStats {
    pub rounds: u64,
    pub failures: u64,
}

/// Run `jobs` now and then every `interval` until `shutdown` resolves.
///
/// Shutdown is observed between rounds. A round that has already started
/// runs to completion.
pub async fn run_periodically<S>(jobs: Vec<Arc<SyncJob>>, interval: Duration, shutdown: S) -> WatchStats
where
    S: Future<Output = ()>,
{
    let mut stats = WatchStats::default();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    info!(
        "Watching {} catalog(s), syncing every {:?}",
        jobs.len(),
        interval
    );

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping periodic sync");
                break;
            }
            _ = ticker.tick() => {
                stats.rounds += 1;
                stats.failures += run_round(&jobs).await;
                debug!("Next sync round in {:?}", interval);
            }
        }
    }

    info!(
        "Periodic sync stopped after {} round(s), {} failed run(s)",
        stats.rounds, stats.failures
    );
    stats
}

/// Run each job once. Returns how many runs failed.
async fn run_round(jobs: &[Arc<SyncJob>]) -> u64 {
    let mut failures = 0;
    for job in jobs {
        let job = job.clone();
        let locale = job.locale().clone();
        let started = Instant::now();

        match tokio::task::spawn_blocking(move || job.run(false)).await {
            Ok(Ok(SyncOutcome::UpToDate { .. })) => {
                debug!("{} catalog already current", locale);
            }
            Ok(Ok(SyncOutcome::Done(report))) => {
                if !report.marker_persisted {
                    warn!(
                        "{} catalog synced but its version marker was not saved",
                        locale
                    );
                }
                info!(
                    "{} catalog synced to {} in {:?}",
                    locale,
                    report.remote_version,
                    started.elapsed()
                );
            }
            Ok(Err(e)) => {
                failures += 1;
                error!("{} catalog sync failed: {}", locale, e);
            }
            Err(e) => {
                failures += 1;
                error!("{} catalog sync panicked: {}", locale, e);
            }
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::SqliteCardStore;
    use crate::sync::{Locale, MarkerStore};
    use crate::testing::{fetcher_for, FakeUpstream};
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_runs_immediately_and_stops_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let upstream = FakeUpstream::new();
        upstream.push_version_json(json!({ "database_version": "1" }));
        upstream.push_catalog_json(json!({ "data": [] }));
        let job = Arc::new(SyncJob::new(
            Locale::English,
            fetcher_for(&upstream),
            Arc::new(SqliteCardStore::open_in_memory().unwrap()),
            MarkerStore::new(dir.path()),
        ));

        let stats = run_periodically(
            vec![job],
            Duration::from_secs(3600),
            tokio::time::sleep(Duration::from_millis(300)),
        )
        .await;

        assert_eq!(stats, WatchStats { rounds: 1, failures: 0 });
        assert_eq!(upstream.catalog_calls(), 1);
        assert!(dir.path().join(".last_db_ver_en.json").exists());
    }

    #[tokio::test]
    async fn test_failed_runs_are_counted_and_loop_continues() {
        let dir = TempDir::new().unwrap();
        let upstream = FakeUpstream::new();
        let job = Arc::new(SyncJob::new(
            Locale::English,
            fetcher_for(&upstream),
            Arc::new(SqliteCardStore::open_in_memory().unwrap()),
            MarkerStore::new(dir.path()),
        ));

        let stats = run_periodically(
            vec![job],
            Duration::from_millis(40),
            tokio::time::sleep(Duration::from_millis(200)),
        )
        .await;

        assert!(stats.rounds >= 2);
        assert_eq!(stats.failures, stats.rounds);
    }
}
