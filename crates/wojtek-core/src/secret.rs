//! Secret management service trait.
//!
//! Defines the interface for resolving the Gemini API key.

use crate::config::SecretConfig;

/// Service for loading secret configuration.
///
/// The credential is resolved at call time, so a key added after startup is
/// picked up by the next request.
///
/// # Security Note
///
/// Implementations must never log secrets or put them in error messages.
#[async_trait::async_trait]
pub trait SecretService: Send + Sync {
    /// Loads the secret configuration.
    ///
    /// # Returns
    ///
    /// - `Ok(SecretConfig)`: Successfully loaded secrets (possibly empty)
    /// - `Err(String)`: Failed to load (error message should not contain secrets)
    async fn load_secrets(&self) -> Result<SecretConfig, String>;

    /// Returns the API key, or `None` when no credential is configured.
    async fn api_key(&self) -> Option<String> {
        match self.load_secrets().await {
            Ok(config) => config.api_key().map(str::to_string),
            Err(_) => None,
        }
    }
}

/// A fixed secret source, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretService {
    config: SecretConfig,
}

impl StaticSecretService {
    pub fn new(config: SecretConfig) -> Self {
        Self { config }
    }

    /// A service holding only the given API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::new(SecretConfig {
            gemini: Some(crate::config::GeminiConfig {
                api_key: api_key.into(),
                model_name: None,
            }),
        })
    }

    /// A service with no credential configured.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SecretService for StaticSecretService {
    async fn load_secrets(&self) -> Result<SecretConfig, String> {
        Ok(self.config.clone())
    }
}
