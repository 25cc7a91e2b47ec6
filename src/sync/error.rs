use crate::catalog_store::ValidationError;
use crate::http::NetworkError;
use std::path::PathBuf;

/// Why a sync run failed. Every variant aborts the run with the store and
/// the version marker left as they were.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("{endpoint} responded with status {status}: {body}")]
    Upstream {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("unexpected {endpoint} payload: {reason}")]
    Payload {
        endpoint: &'static str,
        reason: String,
    },

    #[error("invalid card record: {0}")]
    Validation(#[from] ValidationError),

    #[error("catalog storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// The version marker could not be written. Never fails a sync.
#[derive(Debug, thiserror::Error)]
#[error("could not write version marker {path:?}: {reason}")]
pub struct MarkerError {
    pub path: PathBuf,
    pub reason: String,
}
