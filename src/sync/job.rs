//! One sync run for one locale.

use super::error::SyncError;
use super::locale::Locale;
use super::pipeline::{RunContext, UpsertPipeline};
use super::version_gate::{MarkerStore, VersionGate};
use crate::catalog_store::{CatalogFamily, SqliteCardStore};
use crate::ygoprodeck::{CatalogFetcher, VersionFingerprint};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Checking,
    UpToDate,
    Fetching,
    Writing,
    Done,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncState::Idle => "idle",
            SyncState::Checking => "checking",
            SyncState::UpToDate => "up-to-date",
            SyncState::Fetching => "fetching",
            SyncState::Writing => "writing",
            SyncState::Done => "done",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub family: CatalogFamily,
    pub remote_version: VersionFingerprint,
    pub forced: bool,
    pub cards_created: u64,
    pub cards_updated: u64,
    pub printings_created: u64,
    pub printings_updated: u64,
    pub printings_skipped: u64,
    /// False when the data was written but the version marker was not.
    /// The next run will then re-apply the same version.
    pub marker_persisted: bool,
}

impl SyncReport {
    pub fn cards(&self) -> u64 {
        self.cards_created + self.cards_updated
    }

    pub fn printings(&self) -> u64 {
        self.printings_created + self.printings_updated
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    UpToDate { remote_version: VersionFingerprint },
    Done(SyncReport),
}

/// Check, fetch and write for a single locale.
///
/// Runs are strictly sequential: `Idle -> Checking -> UpToDate` when the
/// marker matches upstream, otherwise `Checking -> Fetching -> Writing -> Done`.
/// A failure in any state aborts the run and leaves the store and marker as
/// they were.
pub struct SyncJob {
    locale: Locale,
    gate: VersionGate,
    fetcher: Arc<CatalogFetcher>,
    store: Arc<SqliteCardStore>,
    pipeline: UpsertPipeline,
    state: Mutex<SyncState>,
}

impl SyncJob {
    pub fn new(
        locale: Locale,
        fetcher: Arc<CatalogFetcher>,
        store: Arc<SqliteCardStore>,
        markers: MarkerStore,
    ) -> Self {
        let gate = VersionGate::new(fetcher.clone(), markers, locale.family());
        Self {
            locale,
            gate,
            fetcher,
            store,
            pipeline: UpsertPipeline::default(),
            state: Mutex::new(SyncState::Idle),
        }
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// State reached by the most recent run. A failed run stays in the state
    /// it failed in.
    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, to: SyncState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != to {
            info!("{} sync: {} -> {}", self.locale, *state, to);
        }
        *state = to;
    }

    pub fn run(&self, force: bool) -> Result<SyncOutcome, SyncError> {
        let started = Instant::now();
        self.transition(SyncState::Idle);
        self.transition(SyncState::Checking);

        let check = self.gate.check(force)?;
        if !check.is_stale {
            self.transition(SyncState::UpToDate);
            return Ok(SyncOutcome::UpToDate {
                remote_version: check.remote_version,
            });
        }

        self.transition(SyncState::Fetching);
        let records = self.fetcher.fetch_all(&self.locale)?;

        self.transition(SyncState::Writing);
        let summary = self.pipeline.apply_all(
            &self.store,
            &RunContext {
                family: self.locale.family(),
                remote_version: &check.remote_version,
                forced: force,
            },
            &records,
        )?;

        let marker_persisted = self.gate.commit(&check.remote_version);
        self.transition(SyncState::Done);

        info!(
            "{} sync done in {:.1}s: {} cards ({} new), {} printings ({} new), {} printings skipped",
            self.locale,
            started.elapsed().as_secs_f64(),
            summary.cards(),
            summary.cards_created,
            summary.printings(),
            summary.printings_created,
            summary.printings_skipped
        );

        Ok(SyncOutcome::Done(SyncReport {
            family: self.locale.family(),
            remote_version: check.remote_version,
            forced: force,
            cards_created: summary.cards_created,
            cards_updated: summary.cards_updated,
            printings_created: summary.printings_created,
            printings_updated: summary.printings_updated,
            printings_skipped: summary.printings_skipped,
            marker_persisted,
        }))
    }
}
