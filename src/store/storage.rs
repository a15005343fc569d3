// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Synchronous key-value storage backends.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage backend errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Durable, synchronous string key-value storage.
///
/// Batch operations apply all of their keys or none of them.
pub trait Storage: Send + Sync + 'static {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_items(&self, items: &[(&str, &str)]) -> Result<(), StorageError>;

    /// Remove keys. Removals stay applied in memory even if persisting them fails.
    fn remove_items(&self, keys: &[&str]) -> Result<(), StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_items(&[(key, value)])
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.remove_items(&[key])
    }
}

/// Process-local storage, used in tests and for ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set_items(&self, items: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in items {
            self.entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_items(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }
}

/// Storage persisted as a JSON object in a single file.
///
/// Every mutation rewrites the file through a temporary sibling and a
/// rename, so a crash leaves either the old or the new contents.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the file at `path`, starting empty if it does not exist.
    ///
    /// A file that cannot be parsed is discarded rather than trusted.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable session file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let body = serde_json::to_string(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set_items(&self, items: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        let mut updated = entries.clone();
        for (key, value) in items {
            updated.insert((*key).to_string(), (*value).to_string());
        }
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn remove_items(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        for key in keys {
            entries.remove(*key);
        }
        self.persist(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "gymgem-session-{}-{}.json",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn test_memory_storage_batch() {
        let storage = MemoryStorage::new();
        storage.set_items(&[("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(storage.get_item("a").as_deref(), Some("1"));
        assert_eq!(storage.len(), 2);

        storage.remove_items(&["a", "b", "missing"]).unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let path = temp_path("reopen");
        let _ = fs::remove_file(&path);

        let storage = FileStorage::open(&path).unwrap();
        storage.set_item("access", "token-a").unwrap();
        storage.set_item("refresh", "token-r").unwrap();
        storage.remove_item("refresh").unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item("access").as_deref(), Some("token-a"));
        assert_eq!(reopened.get_item("refresh"), None);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_storage_discards_corrupt_file() {
        let path = temp_path("corrupt");
        fs::write(&path, "{ definitely not json").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get_item("access"), None);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_storage_failed_write_leaves_entries_untouched() {
        let dir = temp_path("missing-dir");
        let storage = FileStorage::open(dir.join("session.json")).unwrap();

        assert!(storage.set_items(&[("access", "a"), ("user", "{}")]).is_err());
        assert_eq!(storage.get_item("access"), None);
        assert_eq!(storage.get_item("user"), None);
    }
}
