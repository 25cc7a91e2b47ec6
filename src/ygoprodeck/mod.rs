//! Client for the YGOPRODeck public card API.

mod client;
mod models;

pub use client::{CatalogFetcher, DEFAULT_API_BASE_URL};
pub use models::{CatalogPayload, RawCardRecord, RawId, RawPrinting, VersionFingerprint};
