//! In-memory key-value store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use wojtek_core::storage::{
    CHANGE_CHANNEL_CAPACITY, KeyValueStore, StorageChange, StorageError,
};

use super::quota::check_quota;

/// A [`KeyValueStore`] that lives only as long as the process.
///
/// An optional byte quota makes it behave like a browser's local storage.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_quota(None)
    }

    pub fn with_quota(quota_bytes: Option<usize>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes,
            changes,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        {
            let mut entries = self.entries.write().await;
            check_quota(&entries, key, value, self.quota_bytes)?;
            entries.insert(key.to_string(), value.to_string());
        }
        // No subscribers is fine
        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            new_value: Some(value.to_string()),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let removed = self.entries.write().await.remove(key);
        if removed.is_some() {
            let _ = self.changes.send(StorageChange {
                key: key.to_string(),
                new_value: None,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_isolation() {
        let store = MemoryStore::new();
        store.set("user_szaszlyk", "data:image/jpeg;base64,AAAA").await.unwrap();
        store.set("user_egzamin", "data:image/jpeg;base64,BBBB").await.unwrap();

        assert_eq!(
            store.get("user_szaszlyk").await.unwrap().as_deref(),
            Some("data:image/jpeg;base64,AAAA")
        );
        assert_eq!(
            store.get("user_egzamin").await.unwrap().as_deref(),
            Some("data:image/jpeg;base64,BBBB")
        );
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = MemoryStore::new();
        store.set("k", "first").await.unwrap();
        store.set("k", "second").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("second"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_quota_failure_keeps_previous_value() {
        let store = MemoryStore::with_quota(Some(20));
        store.set("k", "small").await.unwrap();

        let err = store.set("k", "this value is far too large").await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("small"));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();

        store.set("user_egzamin", "v1").await.unwrap();
        store.remove("user_egzamin").await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.key, "user_egzamin");
        assert_eq!(first.new_value.as_deref(), Some("v1"));
        assert_eq!(rx.recv().await.unwrap().new_value, None);
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_ok() {
        let store = MemoryStore::new();
        assert!(store.remove("nothing").await.is_ok());
        assert!(store.is_empty().await);
    }
}
