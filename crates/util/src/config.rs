//! Portal client configuration.
//!
//! Settings live in a small JSON document in the standard configuration
//! directory (`~/.config/sacco/config.json` on most platforms). Every field
//! is optional; a missing file yields defaults and an unparseable one is
//! reported through `tracing` and replaced by defaults. `SACCO_API_BASE`
//! overrides the configured base URL.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::expand_tilde;

/// Environment variable allowing callers to override the configuration file path.
pub const CONFIG_PATH_ENV: &str = "SACCO_CONFIG_PATH";

/// Environment variable overriding the configured API base URL.
pub const API_BASE_ENV: &str = "SACCO_API_BASE";

pub const CONFIG_FILE_NAME: &str = "config.json";

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortalConfig {
    /// Root of the REST API; operation paths are appended verbatim.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Lifetime of cached catalog lookups (loan products, members).
    pub catalog_cache_ttl_secs: u64,
    /// Extra path prefixes that never carry the bearer token.
    pub public_paths: Vec<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            catalog_cache_ttl_secs: DEFAULT_CATALOG_CACHE_TTL_SECS,
            public_paths: Vec::new(),
        }
    }
}

impl PortalConfig {
    /// Load from the default path and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&default_config_path())
    }

    /// Load from `path` and apply environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let mut config = read_config(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn catalog_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_cache_ttl_secs)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = env::var(API_BASE_ENV)
            && !base_url.trim().is_empty()
        {
            self.base_url = base_url.trim().to_string();
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
    }
}

pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sacco")
        .join(CONFIG_FILE_NAME)
}

fn read_config(path: &Path) -> Result<PortalConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(config) => Ok(config),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse portal config; using defaults"
                );
                Ok(PortalConfig::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(PortalConfig::default()),
        Err(error) => Err(ConfigError::Io(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        temp_env::with_var(API_BASE_ENV, None::<&str>, || {
            let config = PortalConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
            assert_eq!(config, PortalConfig::default());
        });
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{ "baseUrl": "https://portal.example.coop/api/", "timeoutSecs": 5 }"#).unwrap();

        temp_env::with_var(API_BASE_ENV, None::<&str>, || {
            let config = PortalConfig::load_from_path(&path).unwrap();
            assert_eq!(config.base_url, "https://portal.example.coop/api");
            assert_eq!(config.timeout(), Duration::from_secs(5));
            assert_eq!(config.catalog_cache_ttl_secs, DEFAULT_CATALOG_CACHE_TTL_SECS);
        });
    }

    #[test]
    fn unparseable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        temp_env::with_var(API_BASE_ENV, None::<&str>, || {
            assert_eq!(PortalConfig::load_from_path(&path).unwrap(), PortalConfig::default());
        });
    }

    #[test]
    fn env_overrides_base_url() {
        let dir = tempfile::tempdir().unwrap();
        temp_env::with_var(API_BASE_ENV, Some("https://staging.example.coop/api"), || {
            let config = PortalConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
            assert_eq!(config.base_url, "https://staging.example.coop/api");
        });
    }

    #[test]
    fn default_path_honors_environment_override() {
        temp_env::with_var(CONFIG_PATH_ENV, Some("/tmp/sacco-test/config.json"), || {
            assert_eq!(default_config_path(), PathBuf::from("/tmp/sacco-test/config.json"));
        });
    }

    #[test]
    fn written_file_loads_back_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = PortalConfig {
            public_paths: vec!["/health".into()],
            ..PortalConfig::default()
        };
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        temp_env::with_var(API_BASE_ENV, None::<&str>, || {
            assert_eq!(PortalConfig::load_from_path(&path).unwrap(), config);
        });
    }
}
