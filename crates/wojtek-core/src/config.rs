//! Configuration types.

use serde::{Deserialize, Serialize};

/// Root structure of `secret.json`.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

impl SecretConfig {
    /// Returns the configured API key, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.gemini
            .as_ref()
            .map(|g| g.api_key.trim())
            .filter(|key| !key.is_empty())
    }
}

/// Root structure of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Settings for the local key-value store.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Upper bound on the total size of stored values, in bytes.
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: Option<usize>,
    /// Overrides the default store location.
    #[serde(default)]
    pub path: Option<String>,
}

/// Roughly the 5 MB browsers give each origin.
fn default_quota_bytes() -> Option<usize> {
    Some(5 * 1024 * 1024)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            quota_bytes: default_quota_bytes(),
            path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_api_key_is_ignored() {
        let config = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: "   ".to_string(),
                model_name: None,
            }),
        };
        assert!(config.api_key().is_none());
        assert!(SecretConfig::default().api_key().is_none());
    }

    #[test]
    fn test_app_config_defaults_from_empty_toml() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.storage.quota_bytes, Some(5 * 1024 * 1024));
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn test_app_config_overrides() {
        let config: AppConfig = toml::from_str(
            r#"
            [storage]
            quota_bytes = 1024
            path = "/tmp/wojtek.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.quota_bytes, Some(1024));
        assert_eq!(config.storage.path.as_deref(), Some("/tmp/wojtek.json"));
    }
}
