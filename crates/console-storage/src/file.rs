//! File-backed storage backend.
//!
//! The whole area is one JSON object. Every mutation rewrites it through a
//! sibling temp file followed by a rename, so readers see either the old or
//! the new document and never a partial one.

use crate::{SessionStorage, StorageError, StorageResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

type Entries = BTreeMap<String, String>;

/// Durable storage persisted as a single JSON document.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> StorageResult<Entries> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "session file is not valid JSON");
            StorageError::Encoding(format!("{}: {}", self.path.display(), e))
        })
    }

    fn write_entries(&self, entries: &Entries) -> StorageResult<()> {
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(entries)?;
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), keys = entries.len(), "session file written");
        Ok(())
    }

    /// Entries to rewrite from. An undecodable document is replaced rather
    /// than blocking every later write, including the one that clears it.
    fn entries_for_write(&self) -> StorageResult<Entries> {
        match self.read_entries() {
            Err(StorageError::Encoding(reason)) => {
                warn!(path = %self.path.display(), %reason, "discarding unreadable session file");
                Ok(Entries::new())
            }
            other => other,
        }
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut Entries) -> T) -> StorageResult<T> {
        let _guard = self.write_lock.lock();
        let mut entries = self.entries_for_write()?;
        let result = f(&mut entries);
        self.write_entries(&entries)?;
        Ok(result)
    }
}

impl SessionStorage for FileStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read_entries()?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        self.mutate(|entries| entries.remove(key).is_some())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.read_entries()?.into_keys().collect())
    }

    fn set_many(&self, batch: &[(&str, &str)]) -> StorageResult<()> {
        self.mutate(|entries| {
            for (key, value) in batch {
                entries.insert(key.to_string(), value.to_string());
            }
        })
    }

    fn clear(&self) -> StorageResult<usize> {
        self.mutate(|entries| {
            let removed = entries.len();
            entries.clear();
            removed
        })
    }
}
