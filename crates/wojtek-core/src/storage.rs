//! Key-value store abstraction for persisted browser-style state.
//!
//! Values are plain strings (image data URIs in practice). Every store keeps at
//! most one value per key and the last write wins.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors raised by key-value store implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageError {
    /// Writing the value would exceed the store's byte quota.
    #[error("quota exceeded while writing '{key}': {required} bytes needed, limit is {limit}")]
    QuotaExceeded {
        key: String,
        limit: usize,
        required: usize,
    },

    /// Underlying file could not be read or written.
    #[error("I/O failure: {0}")]
    Io(String),

    /// Stored document could not be encoded or decoded.
    #[error("serialization failure: {0}")]
    Serialization(String),
}

/// Notification emitted after a key changes.
///
/// `new_value` is `None` when the key was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    pub new_value: Option<String>,
}

/// A string-keyed store shared between the upload panel and the gallery.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the current value for `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// On error the previous value must remain in place.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Subscribes to change notifications for all keys.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

/// Default capacity for change notification channels.
pub const CHANGE_CHANNEL_CAPACITY: usize = 32;
