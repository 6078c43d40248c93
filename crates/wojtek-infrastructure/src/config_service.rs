//! Configuration service implementation.
//!
//! Loads [`AppConfig`] from `config.toml` and opens the key-value store it
//! describes.

use crate::paths::WojtekPaths;
use crate::storage::JsonFileStore;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use wojtek_core::config::AppConfig;
use wojtek_core::{Result, WojtekError};

/// Configuration service that loads and caches the application configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: Option<PathBuf>,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the default `config.toml`.
    pub fn new() -> Self {
        Self::with_path(WojtekPaths::config_file().ok())
    }

    /// Creates a service reading `path`; `None` always yields defaults.
    pub fn with_path(path: Option<PathBuf>) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A missing file yields defaults; a malformed file is an error.
    pub fn get_config(&self) -> Result<AppConfig> {
        if let Ok(read_lock) = self.config.read() {
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = match &self.path {
            Some(path) => Self::load_config(path)?,
            None => AppConfig::default(),
        };

        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    /// Resolves where the key-value store lives.
    pub fn storage_path(&self) -> Result<PathBuf> {
        let config = self.get_config()?;
        match config.storage.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => WojtekPaths::local_storage_file()
                .map_err(|e| WojtekError::config(e.to_string())),
        }
    }

    /// Opens the configured [`JsonFileStore`].
    pub async fn open_store(&self) -> Result<JsonFileStore> {
        let config = self.get_config()?;
        let path = self.storage_path()?;
        tracing::info!("[ConfigService] Using local storage at {}", path.display());
        Ok(JsonFileStore::open(path, config.storage.quota_bytes).await?)
    }

    fn load_config(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            tracing::debug!(
                "[ConfigService] {} not found, using defaults",
                path.display()
            );
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
