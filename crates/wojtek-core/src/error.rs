//! Error types for the Wojtek application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageError;

/// A shared error type for the Wojtek crates.
///
/// The three AI operations report configuration and payload problems through
/// distinct variants so callers can pick their own degraded behavior.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum WojtekError {
    /// No API credential is configured.
    #[error("API_KEY missing")]
    MissingCredential,

    /// The remote service could not be reached or answered with an error status.
    #[error("Transport error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The response envelope had no content parts.
    #[error("No image")]
    NoContent,

    /// None of the response parts carried an inline image payload.
    #[error("Failed")]
    NoInlineImage,

    /// Key-value store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Audio or image processing failure
    #[error("Media error: {0}")]
    Media(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WojtekError {
    /// Creates a Transport error
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Creates a Media error
    pub fn media(message: impl Into<String>) -> Self {
        Self::Media(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a missing credential error
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingCredential)
    }

    /// Check if this is a storage error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Check if the storage quota was exceeded.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::Storage(StorageError::QuotaExceeded { .. }))
    }
}

impl From<std::io::Error> for WojtekError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for WojtekError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for WojtekError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for WojtekError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, WojtekError>`.
pub type Result<T> = std::result::Result<T, WojtekError>;
