//! In-memory storage backend.

use crate::{SessionStorage, StorageResult};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Process-local storage. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.data.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        Ok(self.data.lock().remove(key).is_some())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.data.lock().keys().cloned().collect())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        let mut data = self.data.lock();
        for (key, value) in entries {
            data.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn clear(&self) -> StorageResult<usize> {
        let mut data = self.data.lock();
        let removed = data.len();
        data.clear();
        Ok(removed)
    }
}
