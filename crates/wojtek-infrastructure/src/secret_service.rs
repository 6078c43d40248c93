//! Secret service implementation.
//!
//! The Gemini API key comes from the process environment (`API_KEY`, or
//! `GEMINI_API_KEY`) and falls back to `secret.json` in the config directory.

use crate::paths::WojtekPaths;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use wojtek_core::config::{GeminiConfig, SecretConfig};
use wojtek_core::secret::SecretService;

/// Environment variables checked for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Service for resolving the API key.
///
/// Environment variables are read on every call. The file is read once and
/// cached.
///
/// # Example
///
/// ```ignore
/// use wojtek_infrastructure::SecretServiceImpl;
/// use wojtek_core::secret::SecretService;
///
/// let service = SecretServiceImpl::default()?;
/// let key = service.api_key().await;
/// ```
#[derive(Clone)]
pub struct SecretServiceImpl {
    /// Cached secret config loaded from the file.
    file_secrets: Arc<RwLock<Option<SecretConfig>>>,
    file_path: Option<PathBuf>,
    env: EnvLookup,
}

impl SecretServiceImpl {
    pub fn default() -> anyhow::Result<Self> {
        Self::new(None)
    }

    /// Creates a new SecretServiceImpl.
    ///
    /// `file_path` overrides the default `secret.json` location. When the home
    /// directory cannot be resolved only the environment is consulted.
    pub fn new(file_path: Option<&Path>) -> anyhow::Result<Self> {
        let file_path = match file_path {
            Some(path) => Some(path.to_path_buf()),
            None => WojtekPaths::secret_file().ok(),
        };

        Ok(Self {
            file_secrets: Arc::new(RwLock::new(None)),
            file_path,
            env: Arc::new(|name| std::env::var(name).ok()),
        })
    }

    /// Replaces the environment lookup.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    fn env_api_key(&self) -> Option<String> {
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| (self.env)(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }

    /// Loads the file secrets if not already cached.
    fn load_file_secrets(&self) -> Result<SecretConfig, String> {
        {
            let read_lock = self
                .file_secrets
                .read()
                .map_err(|_| "Secret cache lock poisoned".to_string())?;
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = match &self.file_path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
                if content.trim().is_empty() {
                    SecretConfig::default()
                } else {
                    serde_json::from_str(&content)
                        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?
                }
            }
            _ => SecretConfig::default(),
        };

        {
            let mut write_lock = self
                .file_secrets
                .write()
                .map_err(|_| "Secret cache lock poisoned".to_string())?;
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig, String> {
        let mut config = match self.load_file_secrets() {
            Ok(config) => config,
            Err(e) if self.env_api_key().is_some() => {
                tracing::warn!("[SecretService] Ignoring unreadable secret file: {}", e);
                SecretConfig::default()
            }
            Err(e) => return Err(e),
        };

        if let Some(api_key) = self.env_api_key() {
            let model_name = config.gemini.as_ref().and_then(|g| g.model_name.clone());
            config.gemini = Some(GeminiConfig {
                api_key,
                model_name,
            });
        }

        Ok(config)
    }
}
