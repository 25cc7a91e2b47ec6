use super::models::{CatalogPayload, RawCardRecord, VersionFingerprint};
use crate::http::RateLimitedClient;
use crate::sync::{Locale, SyncError};
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_API_BASE_URL: &str = "https://db.ygoprodeck.com/api/v7";

const CHECK_DB_VER_ENDPOINT: &str = "checkDBVer.php";
const CARDINFO_ENDPOINT: &str = "cardinfo.php";
const ERROR_BODY_MAX_CHARS: usize = 200;

/// Fetches the version fingerprint and full card lists from upstream.
///
/// All calls go through the shared [`RateLimitedClient`], so the throttle and
/// retry rules apply to every request issued here.
pub struct CatalogFetcher {
    http: Arc<RateLimitedClient>,
    base_url: String,
}

impl CatalogFetcher {
    pub fn new(http: Arc<RateLimitedClient>, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the upstream database version. The same fingerprint covers every
    /// language.
    pub fn fetch_version(&self) -> Result<VersionFingerprint, SyncError> {
        let body = self.get_ok(CHECK_DB_VER_ENDPOINT, &[])?;
        let value = serde_json::from_str(&body).map_err(|e| SyncError::Payload {
            endpoint: CHECK_DB_VER_ENDPOINT,
            reason: e.to_string(),
        })?;
        Ok(VersionFingerprint::new(value))
    }

    /// Fetch the full card list for `locale` in a single request.
    ///
    /// The localized family sends `language=<code>`. English sends no
    /// parameters at all.
    pub fn fetch_all(&self, locale: &Locale) -> Result<Vec<RawCardRecord>, SyncError> {
        let language_param;
        let query: &[(&str, &str)] = match locale.language_param() {
            Some(language) => {
                language_param = [("language", language)];
                &language_param
            }
            None => &[],
        };

        let body = self.get_ok(CARDINFO_ENDPOINT, query)?;
        let payload: CatalogPayload =
            serde_json::from_str(&body).map_err(|e| SyncError::Payload {
                endpoint: CARDINFO_ENDPOINT,
                reason: e.to_string(),
            })?;

        info!(
            "Fetched {} card records for {} catalog",
            payload.data.len(),
            locale
        );
        Ok(payload.data)
    }

    fn get_ok(&self, endpoint: &'static str, query: &[(&str, &str)]) -> Result<String, SyncError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self.http.get(&url, query)?;
        debug!(
            "{} responded {} ({} bytes)",
            endpoint,
            response.status,
            response.body.len()
        );

        if !response.is_ok() {
            return Err(SyncError::Upstream {
                endpoint,
                status: response.status,
                body: response.body_snippet(ERROR_BODY_MAX_CHARS),
            });
        }
        Ok(response.body)
    }
}
