//! JSON file backed key-value store.
//!
//! The whole store is one JSON object shared by every process using the same
//! path. Each write takes an exclusive lock on a sidecar `.lock` file, re-reads
//! the document, applies the change and writes a temporary file that is then
//! renamed over the original. Writers to different keys therefore never undo
//! each other, and a failed write never leaves a partial document behind.

use std::collections::{BTreeMap, HashMap};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use wojtek_core::storage::{
    CHANGE_CHANNEL_CAPACITY, KeyValueStore, StorageChange, StorageError,
};

use super::quota::check_quota;

/// How often [`JsonFileStore::watch`] looks for writes from other processes.
pub const RELOAD_INTERVAL: Duration = Duration::from_secs(1);

/// A [`KeyValueStore`] persisted to a JSON document on disk.
pub struct JsonFileStore {
    path: PathBuf,
    /// Last document read or written by this handle.
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
    changes: broadcast::Sender<StorageChange>,
}

enum Edit {
    Set { key: String, value: String },
    Remove { key: String },
}

impl JsonFileStore {
    /// Opens the store at `path`, loading existing entries.
    ///
    /// A missing or empty file yields an empty store.
    pub async fn open(
        path: impl Into<PathBuf>,
        quota_bytes: Option<usize>,
    ) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = read_document(&path).await?;
        tracing::debug!(
            "[JsonFileStore] Opened {} with {} entries",
            path.display(),
            entries.len()
        );

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            entries: RwLock::new(entries),
            quota_bytes,
            changes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the file and notifies subscribers about keys changed by another process.
    pub async fn reload(&self) -> Result<usize, StorageError> {
        let on_disk = read_document(&self.path).await?;
        let mut entries = self.entries.write().await;
        let changed = diff_entries(&entries, &on_disk);
        *entries = on_disk;
        drop(entries);

        let count = changed.len();
        self.broadcast(changed);
        if count > 0 {
            tracing::info!("[JsonFileStore] Reload picked up {} external changes", count);
        }
        Ok(count)
    }

    /// Polls [`JsonFileStore::reload`] every `period` until the store is dropped.
    pub fn watch(store: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(store);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(store) = weak.upgrade() else {
                    break;
                };
                if let Err(e) = store.reload().await {
                    tracing::warn!("[JsonFileStore] Reload of {} failed: {}", store.path.display(), e);
                }
            }
            tracing::debug!("[JsonFileStore] Watcher stopped");
        })
    }

    /// Applies `edit` to the on-disk document under the file lock and
    /// refreshes the cache from what was written.
    async fn apply(&self, edit: Edit) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;

        let path = self.path.clone();
        let quota = self.quota_bytes;
        let fresh = tokio::task::spawn_blocking(move || locked_update(&path, quota, edit))
            .await
            .map_err(|e| StorageError::Io(format!("storage task failed: {e}")))??;

        let changed = diff_entries(&entries, &fresh);
        *entries = fresh;
        drop(entries);

        self.broadcast(changed);
        Ok(())
    }

    fn broadcast(&self, changed: Vec<StorageChange>) {
        for change in changed {
            // No subscribers is fine
            let _ = self.changes.send(change);
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.apply(Edit::Set {
            key: key.to_string(),
            value: value.to_string(),
        })
        .await?;
        tracing::debug!("[JsonFileStore] Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.apply(Edit::Remove {
            key: key.to_string(),
        })
        .await
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

/// Exclusive lock on the sidecar `.lock` file, released when dropped.
struct FileLock {
    _file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, StorageError> {
        use fs2::FileExt;

        let lock_path = path.with_extension("lock");
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_error)?;
        file.lock_exclusive().map_err(|e| {
            StorageError::Io(format!("Failed to lock {}: {}", lock_path.display(), e))
        })?;
        Ok(Self { _file: file })
    }
}

/// Read-modify-write of the document. Blocking.
fn locked_update(
    path: &Path,
    quota: Option<usize>,
    edit: Edit,
) -> Result<HashMap<String, String>, StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
    }

    let _lock = FileLock::acquire(path)?;
    let mut entries = match std::fs::read_to_string(path) {
        Ok(content) => parse_document(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
        Err(e) => return Err(io_error(e)),
    };

    match edit {
        Edit::Set { key, value } => {
            check_quota(&entries, &key, &value, quota)?;
            entries.insert(key, value);
        }
        Edit::Remove { key } => {
            if entries.remove(&key).is_none() {
                return Ok(entries);
            }
        }
    }

    write_document(path, &entries)?;
    Ok(entries)
}

/// Writes `entries` to a temporary file and renames it over `path`.
fn write_document(path: &Path, entries: &HashMap<String, String>) -> Result<(), StorageError> {
    // Sorted keys keep the file stable across writes
    let sorted: BTreeMap<&String, &String> = entries.iter().collect();
    let json = serde_json::to_string_pretty(&sorted)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    let tmp_path = temp_path(path);
    let mut tmp_file = File::create(&tmp_path).map_err(io_error)?;
    tmp_file.write_all(json.as_bytes()).map_err(io_error)?;
    tmp_file.sync_all().map_err(io_error)?;
    drop(tmp_file);

    std::fs::rename(&tmp_path, path).map_err(io_error)
}

/// `dir/.name.tmp` next to the document.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

/// Changes that turn `old` into `new`.
fn diff_entries(
    old: &HashMap<String, String>,
    new: &HashMap<String, String>,
) -> Vec<StorageChange> {
    let mut changed = Vec::new();
    for (key, value) in new {
        if old.get(key) != Some(value) {
            changed.push(StorageChange {
                key: key.clone(),
                new_value: Some(value.clone()),
            });
        }
    }
    for key in old.keys() {
        if !new.contains_key(key) {
            changed.push(StorageChange {
                key: key.clone(),
                new_value: None,
            });
        }
    }
    changed
}

async fn read_document(path: &Path) -> Result<HashMap<String, String>, StorageError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => parse_document(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(io_error(e)),
    }
}

fn parse_document(content: &str) -> Result<HashMap<String, String>, StorageError> {
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_str(content).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn io_error(err: std::io::Error) -> StorageError {
    StorageError::Io(format!("{} (kind: {:?})", err, err.kind()))
}
