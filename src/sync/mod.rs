//! Catalog synchronization: version gate, upsert pipeline and per-locale jobs.

mod error;
mod job;
mod locale;
mod pipeline;
mod version_gate;
pub mod watch;

pub use error::{MarkerError, SyncError};
pub use job::{SyncJob, SyncOutcome, SyncReport, SyncState};
pub use locale::{Locale, DEFAULT_LANGUAGE};
pub use pipeline::{ApplySummary, AppliedCard, RunContext, UpsertPipeline, PROGRESS_LOG_INTERVAL};
pub use version_gate::{marker_file_name, MarkerStore, VersionCheck, VersionGate};
