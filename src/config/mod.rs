mod file_config;

pub use file_config::{FileConfig, SyncConfig};

use crate::http::{RetryPolicy, TransportSettings, DEFAULT_MAX_REQUESTS_PER_SEC};
use crate::sync::watch::DEFAULT_WATCH_INTERVAL;
use crate::sync::DEFAULT_LANGUAGE;
use crate::ygoprodeck::DEFAULT_API_BASE_URL;
use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

/// Upstream bans clients above this rate.
pub const UPSTREAM_MAX_REQUESTS_PER_SEC: u32 = 20;

pub const CATALOG_DB_FILE_NAME: &str = "catalog.db";

/// CLI arguments that take part in config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub marker_dir: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub logging_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub marker_dir: PathBuf,
    pub logging_level: LevelFilter,
    pub sync: SyncSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub api_base_url: String,
    pub max_requests_per_sec: u32,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub max_attempts: u32,
    pub backoff_step: Duration,
    pub default_language: String,
    pub watch_interval: Duration,
    pub user_agent: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        let transport = TransportSettings::default();
        let retry = RetryPolicy::default();
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            max_requests_per_sec: DEFAULT_MAX_REQUESTS_PER_SEC,
            connect_timeout: transport.connect_timeout,
            read_timeout: transport.read_timeout,
            max_attempts: retry.max_attempts,
            backoff_step: retry.backoff_step,
            default_language: DEFAULT_LANGUAGE.to_string(),
            watch_interval: DEFAULT_WATCH_INTERVAL,
            user_agent: transport.user_agent,
        }
    }
}

impl SyncSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_step: self.backoff_step,
        }
    }

    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            user_agent: self.user_agent.clone(),
        }
    }

    fn from_file(file: SyncConfig, cli: &CliConfig) -> Result<Self> {
        let defaults = SyncSettings::default();

        let max_requests_per_sec = file
            .max_requests_per_sec
            .unwrap_or(defaults.max_requests_per_sec);
        if max_requests_per_sec == 0 || max_requests_per_sec > UPSTREAM_MAX_REQUESTS_PER_SEC {
            bail!(
                "sync.max_requests_per_sec must be between 1 and {}, got {}",
                UPSTREAM_MAX_REQUESTS_PER_SEC,
                max_requests_per_sec
            );
        }

        let max_attempts = file.max_attempts.unwrap_or(defaults.max_attempts);
        if max_attempts == 0 {
            bail!("sync.max_attempts must be at least 1");
        }

        let watch_interval_hours = file.watch_interval_hours.unwrap_or(24);
        if watch_interval_hours == 0 {
            bail!("sync.watch_interval_hours must be at least 1");
        }

        let default_language = file
            .default_language
            .unwrap_or(defaults.default_language);
        if default_language.trim().is_empty() {
            bail!("sync.default_language must not be empty");
        }

        Ok(SyncSettings {
            api_base_url: file
                .api_base_url
                .or_else(|| cli.api_base_url.clone())
                .unwrap_or(defaults.api_base_url),
            max_requests_per_sec,
            connect_timeout: file
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            read_timeout: file
                .read_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.read_timeout),
            max_attempts,
            backoff_step: file
                .backoff_step_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.backoff_step),
            default_language,
            watch_interval: Duration::from_secs(watch_interval_hours.saturating_mul(60 * 60)),
            user_agent: file.user_agent.unwrap_or(defaults.user_agent),
        })
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and an optional TOML file.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| anyhow!("db_dir must be specified via --db-dir or in config file"))?;
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let marker_dir = file
            .marker_dir
            .map(PathBuf::from)
            .or_else(|| cli.marker_dir.clone())
            .unwrap_or_else(|| db_dir.clone());

        let logging_level = match file.logging_level.or_else(|| cli.logging_level.clone()) {
            Some(level) => parse_logging_level(&level)
                .ok_or_else(|| anyhow!("Invalid logging level: {}", level))?,
            None => LevelFilter::INFO,
        };

        let sync = SyncSettings::from_file(file.sync.unwrap_or_default(), cli)?;

        Ok(AppConfig {
            db_dir,
            marker_dir,
            logging_level,
            sync,
        })
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.db_dir.join(CATALOG_DB_FILE_NAME)
    }
}

fn parse_logging_level(s: &str) -> Option<LevelFilter> {
    s.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli_with_dir(dir: &TempDir) -> CliConfig {
        CliConfig {
            db_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_logging_level() {
        assert_eq!(parse_logging_level("debug"), Some(LevelFilter::DEBUG));
        assert_eq!(parse_logging_level("WARN"), Some(LevelFilter::WARN));
        assert_eq!(parse_logging_level("off"), Some(LevelFilter::OFF));
        assert_eq!(parse_logging_level("loud"), None);
    }

    #[test]
    fn test_resolve_cli_only() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::resolve(&cli_with_dir(&dir), None).unwrap();

        assert_eq!(config.db_dir, dir.path());
        assert_eq!(config.marker_dir, dir.path());
        assert_eq!(config.logging_level, LevelFilter::INFO);
        assert_eq!(config.sync, SyncSettings::default());
        assert_eq!(config.catalog_db_path(), dir.path().join("catalog.db"));
    }

    #[test]
    fn test_defaults() {
        let settings = SyncSettings::default();
        assert_eq!(settings.api_base_url, "https://db.ygoprodeck.com/api/v7");
        assert_eq!(settings.max_requests_per_sec, 5);
        assert_eq!(settings.connect_timeout, Duration::from_secs(5));
        assert_eq!(settings.read_timeout, Duration::from_secs(30));
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.backoff_step, Duration::from_secs(1));
        assert_eq!(settings.default_language, "fr");
        assert_eq!(settings.watch_interval, Duration::from_secs(86400));
    }

    #[test]
    fn test_toml_overrides_cli() {
        let cli_dir = TempDir::new().unwrap();
        let file_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(cli_dir.path().to_path_buf()),
            api_base_url: Some("http://cli".to_string()),
            logging_level: Some("warn".to_string()),
            ..Default::default()
        };
        let file = FileConfig {
            db_dir: Some(file_dir.path().to_string_lossy().to_string()),
            logging_level: Some("trace".to_string()),
            sync: Some(SyncConfig {
                api_base_url: Some("http://file".to_string()),
                max_requests_per_sec: Some(10),
                watch_interval_hours: Some(2),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file)).unwrap();

        assert_eq!(config.db_dir, file_dir.path());
        assert_eq!(config.logging_level, LevelFilter::TRACE);
        assert_eq!(config.sync.api_base_url, "http://file");
        assert_eq!(config.sync.max_requests_per_sec, 10);
        assert_eq!(config.sync.watch_interval, Duration::from_secs(7200));
        assert_eq!(config.sync.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_cli_base_url_used_without_file_value() {
        let dir = TempDir::new().unwrap();
        let cli = CliConfig {
            api_base_url: Some("http://localhost:9000".to_string()),
            ..cli_with_dir(&dir)
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.sync.api_base_url, "http://localhost:9000");
    }

    #[test]
    fn test_missing_db_dir() {
        let err = AppConfig::resolve(&CliConfig::default(), None).unwrap_err();
        assert!(err.to_string().contains("db_dir must be specified"));

        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/nonexistent/card/db")),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli, None).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_rate_above_upstream_limit_is_rejected() {
        let dir = TempDir::new().unwrap();
        for rate in [0, 21] {
            let file = FileConfig {
                sync: Some(SyncConfig {
                    max_requests_per_sec: Some(rate),
                    ..Default::default()
                }),
                ..Default::default()
            };
            let err = AppConfig::resolve(&cli_with_dir(&dir), Some(file)).unwrap_err();
            assert!(err.to_string().contains("max_requests_per_sec"));
        }
    }

    #[test]
    fn test_zero_attempts_and_interval_rejected() {
        let dir = TempDir::new().unwrap();
        let file = FileConfig {
            sync: Some(SyncConfig {
                max_attempts: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli_with_dir(&dir), Some(file)).is_err());

        let file = FileConfig {
            sync: Some(SyncConfig {
                watch_interval_hours: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli_with_dir(&dir), Some(file)).is_err());
    }

    #[test]
    fn test_invalid_logging_level_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = FileConfig {
            logging_level: Some("chatty".to_string()),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli_with_dir(&dir), Some(file)).is_err());
    }
}
