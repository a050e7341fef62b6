//! Session storage for the QA console.
//!
//! This crate provides the durable key-value area that holds session state:
//! - **MemoryStorage**: process-local map, used by tests and ephemeral runs
//! - **FileStorage**: a single JSON document on disk, rewritten atomically
//!
//! On top of it sits the [`CredentialStore`], the only writer of the access
//! token and refresh handle.

mod credentials;
mod file;
mod keys;
mod memory;
mod traits;

pub use credentials::{Credential, CredentialStore};
pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::SessionStorage;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Encoding(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
