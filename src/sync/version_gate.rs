//! Version markers and the staleness check that gates every sync.

use super::error::{MarkerError, SyncError};
use crate::catalog_store::CatalogFamily;
use crate::ygoprodeck::{CatalogFetcher, VersionFingerprint};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub fn marker_file_name(family: CatalogFamily) -> &'static str {
    match family {
        CatalogFamily::Localized => ".last_db_ver.json",
        CatalogFamily::English => ".last_db_ver_en.json",
    }
}

/// Reads and writes the per-family version marker files.
///
/// A marker holds the last successfully applied upstream fingerprint as
/// pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct MarkerStore {
    dir: PathBuf,
}

impl MarkerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, family: CatalogFamily) -> PathBuf {
        self.dir.join(marker_file_name(family))
    }

    /// The stored fingerprint, or `None` when the marker is absent, unreadable
    /// or not valid JSON. Any of those forces the next sync to run.
    pub fn load(&self, family: CatalogFamily) -> Option<VersionFingerprint> {
        let path = self.path_for(family);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No version marker at {:?}", path);
                return None;
            }
            Err(e) => {
                warn!("Could not read version marker {:?}: {}", path, e);
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => Some(VersionFingerprint::new(value)),
            Err(e) => {
                warn!("Ignoring corrupt version marker {:?}: {}", path, e);
                None
            }
        }
    }

    /// Replace the marker through a temp file and rename.
    pub fn save(
        &self,
        family: CatalogFamily,
        version: &VersionFingerprint,
    ) -> Result<(), MarkerError> {
        let path = self.path_for(family);
        let marker_error = |reason: String| MarkerError {
            path: path.clone(),
            reason,
        };

        let json = serde_json::to_string_pretty(version).map_err(|e| marker_error(e.to_string()))?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| marker_error(e.to_string()))?;
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(marker_error(e.to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCheck {
    pub remote_version: VersionFingerprint,
    pub local_version: Option<VersionFingerprint>,
    pub is_stale: bool,
}

/// Decides whether a family needs a full refresh.
pub struct VersionGate {
    fetcher: Arc<CatalogFetcher>,
    markers: MarkerStore,
    family: CatalogFamily,
}

impl VersionGate {
    pub fn new(fetcher: Arc<CatalogFetcher>, markers: MarkerStore, family: CatalogFamily) -> Self {
        Self {
            fetcher,
            markers,
            family,
        }
    }

    /// Fetch the remote fingerprint and compare it with the local marker.
    ///
    /// The remote version is fetched even when `force` is set, since it is
    /// what gets committed after a successful write.
    pub fn check(&self, force: bool) -> Result<VersionCheck, SyncError> {
        let remote_version = self.fetcher.fetch_version()?;
        let local_version = self.markers.load(self.family);
        let is_stale = force || local_version.as_ref() != Some(&remote_version);

        match &local_version {
            Some(local) if !is_stale => {
                info!("{} catalog is up to date at {}", self.family, local)
            }
            Some(local) => info!(
                "{} catalog at {} needs refresh to {}{}",
                self.family,
                local,
                remote_version,
                if force { " (forced)" } else { "" }
            ),
            None => info!(
                "{} catalog has no version marker, syncing to {}",
                self.family, remote_version
            ),
        }

        Ok(VersionCheck {
            remote_version,
            local_version,
            is_stale,
        })
    }

    /// Persist `remote_version` as the applied version. A failure is logged
    /// and reported as `false`. It never undoes the write that preceded it.
    pub fn commit(&self, remote_version: &VersionFingerprint) -> bool {
        match self.markers.save(self.family, remote_version) {
            Ok(()) => {
                debug!(
                    "Recorded {} catalog version {}",
                    self.family, remote_version
                );
                true
            }
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }
}
