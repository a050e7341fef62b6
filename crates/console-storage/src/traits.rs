//! Storage trait definitions.

use crate::StorageResult;

/// Trait for session storage backends.
///
/// Implementations are synchronous: every call completes before returning.
pub trait SessionStorage: Send + Sync {
    /// Store a value
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Retrieve a value
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete a value
    fn delete(&self, key: &str) -> StorageResult<bool>;

    /// List every key currently stored.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Check if a key exists
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Store several values together.
    ///
    /// Backends that can write all entries in one step override this so a
    /// reader never observes half of the batch.
    fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove every key. Returns the number of keys removed.
    fn clear(&self) -> StorageResult<usize> {
        let mut removed = 0;
        for key in self.keys()? {
            if self.delete(&key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
