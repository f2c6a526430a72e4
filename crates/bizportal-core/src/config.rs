//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend URL, request timeout, where the durable
//! credential slot lives, and the last used sign-in codes.
//!
//! Configuration is stored at `~/.config/bizportal/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::{FileStore, KeyValueStore, KeyringStore};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "bizportal";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Durable slot file name in the data directory
const STORE_FILE: &str = "local-storage.json";

/// Backend used when nothing is configured
pub const DEFAULT_API_BASE_URL: &str = "https://localhost:7117/api";

/// Transport timeout. Short so a dead backend fails fast.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Environment variable overriding the backend URL
pub const API_URL_ENV: &str = "BIZPORTAL_API_URL";

/// Environment variable holding the durable file store passphrase
pub const VAULT_PASSPHRASE_ENV: &str = "BIZPORTAL_VAULT_PASSPHRASE";

/// Where the durable slot is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurableBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub durable_backend: DurableBackend,
    /// Seal the durable file slot with a key derived from this passphrase.
    /// Never written to the config file.
    #[serde(skip)]
    pub vault_passphrase: Option<String>,
    #[serde(default)]
    pub last_usercode: Option<String>,
    #[serde(default)]
    pub last_orgcode: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Record the codes of a successful sign-in in the config file.
    ///
    /// Starts from what is on disk so overrides applied to a loaded config
    /// for one run are not persisted.
    pub fn remember_sign_in(usercode: &str, orgcode: &str) -> Result<()> {
        Self::remember_sign_in_at(&Self::config_path()?, usercode, orgcode)
    }

    pub fn remember_sign_in_at(path: &Path, usercode: &str, orgcode: &str) -> Result<()> {
        let mut stored = Self::load_from(path)?;
        stored.last_usercode = Some(usercode.to_string());
        stored.last_orgcode = Some(orgcode.to_string()).filter(|o| !o.is_empty());
        stored.save_to(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Apply overrides from the environment
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                debug!(url = %url, "Backend URL overridden from environment");
                self.api_base_url = Some(url);
            }
        }
        if let Ok(passphrase) = std::env::var(VAULT_PASSPHRASE_ENV) {
            if !passphrase.is_empty() {
                self.vault_passphrase = Some(passphrase);
            }
        }
        self
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Open the durable slot store this config points at.
    pub fn open_durable_store(&self) -> Result<Arc<dyn KeyValueStore>> {
        match self.durable_backend {
            DurableBackend::Keyring => Ok(Arc::new(KeyringStore::new(APP_NAME))),
            DurableBackend::File => {
                let path = self.data_dir()?.join(STORE_FILE);
                self.open_file_store(&path)
            }
        }
    }

    /// Open a file-backed durable store at `path`, sealed when a passphrase is set.
    pub fn open_file_store(&self, path: &Path) -> Result<Arc<dyn KeyValueStore>> {
        let store = match self.vault_passphrase.as_deref() {
            Some(passphrase) if !passphrase.is_empty() => {
                FileStore::open_encrypted(path, passphrase)?
            }
            _ => FileStore::open(path)?,
        };
        Ok(Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.durable_backend, DurableBackend::File);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config {
            api_base_url: Some("https://erp.example.com/api".to_string()),
            durable_backend: DurableBackend::Keyring,
            last_usercode: Some("u1".to_string()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_base_url(), "https://erp.example.com/api");
        assert_eq!(loaded.durable_backend, DurableBackend::Keyring);
        assert_eq!(loaded.last_usercode.as_deref(), Some("u1"));
    }

    #[test]
    fn test_vault_passphrase_never_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config {
            vault_passphrase: Some("correct horse".to_string()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("correct horse"));
        assert!(!raw.contains("vault_passphrase"));
    }

    #[test]
    fn test_passphrase_in_old_config_file_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"vault_passphrase": "correct horse"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.vault_passphrase.is_none());
    }

    #[test]
    fn test_remember_sign_in_keeps_stored_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let stored = Config {
            api_base_url: Some("https://erp.example.com/api".to_string()),
            ..Config::default()
        };
        stored.save_to(&path).unwrap();

        // A run-time override on a loaded copy stays in memory
        let mut running = Config::load_from(&path).unwrap();
        running.api_base_url = Some("http://127.0.0.1:18099/api".to_string());

        Config::remember_sign_in_at(&path, "u1", "").unwrap();
        assert_eq!(running.api_base_url(), "http://127.0.0.1:18099/api");

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_base_url(), "https://erp.example.com/api");
        assert_eq!(loaded.last_usercode.as_deref(), Some("u1"));
        assert!(loaded.last_orgcode.is_none());
    }

    #[test]
    fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.api_base_url.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"request_timeout_secs": 3}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.request_timeout(), Duration::from_secs(3));
        assert_eq!(loaded.durable_backend, DurableBackend::File);
    }

    #[test]
    fn test_open_file_store_with_passphrase_seals_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local-storage.json");
        let config = Config {
            vault_passphrase: Some("correct horse".to_string()),
            ..Config::default()
        };

        let store = config.open_file_store(&path).unwrap();
        store.set("jwt_token", "abc123");
        assert_eq!(store.name(), "encrypted-file");

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("abc123"));
    }
}
