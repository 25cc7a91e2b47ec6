//! Rate-limited, version-gated sync of the YGOPRODeck card catalog into a
//! local SQLite store.
//!
//! The localized and English catalogs are synced independently. Each run
//! checks the upstream database version first and only downloads the full
//! card list when it differs from the locally recorded one.

pub mod catalog_store;
pub mod config;
pub mod http;
pub mod sqlite_persistence;
pub mod sync;
pub mod ygoprodeck;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog_store::{CardFilter, CatalogFamily, SqliteCardStore};
pub use sync::{Locale, SyncError, SyncJob, SyncOutcome, SyncReport};
