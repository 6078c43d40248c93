//! Unified path management for wojtek configuration and state files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/wojtek/            # Config directory
//! ├── config.toml              # Application configuration
//! └── secret.json              # API key
//!
//! ~/.local/share/wojtek/       # Data directory
//! └── local_storage.json       # Persisted image slots
//! ```

use std::path::PathBuf;

const APP_NAME: &str = "wojtek";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Path resolution for wojtek files, following the platform conventions from `dirs`.
pub struct WojtekPaths;

impl WojtekPaths {
    /// Returns the configuration directory (e.g. `~/.config/wojtek/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the data directory (e.g. `~/.local/share/wojtek/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }

    /// Returns the path of the persisted key-value store.
    pub fn local_storage_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("local_storage.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_files_live_under_config_dir() {
        let Ok(config_dir) = WojtekPaths::config_dir() else {
            // No home directory in this environment
            return;
        };
        assert!(config_dir.ends_with("wojtek"));
        assert!(WojtekPaths::config_file().unwrap().starts_with(&config_dir));
        assert!(WojtekPaths::secret_file().unwrap().ends_with("secret.json"));
    }

    #[test]
    fn test_local_storage_file() {
        if let Ok(path) = WojtekPaths::local_storage_file() {
            assert!(path.ends_with("local_storage.json"));
            assert!(path.starts_with(WojtekPaths::data_dir().unwrap()));
        }
    }
}
