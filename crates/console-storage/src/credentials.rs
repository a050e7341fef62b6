//! Credential store: the access token and refresh handle pair.

use crate::{SessionStorage, StorageKeys, StorageResult};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Access credential plus the handle used to obtain its successor.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token_id: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, refresh_token_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token_id: refresh_token_id.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token_id", &"[REDACTED]")
            .finish()
    }
}

/// Pure data access over the session area. No validation, no policy.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn SessionStorage>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// Current credential. Absent unless both halves are stored.
    pub fn get(&self) -> StorageResult<Option<Credential>> {
        let access_token = self.storage.get(StorageKeys::ACCESS_TOKEN)?;
        let refresh_token_id = self.storage.get(StorageKeys::REFRESH_TOKEN_ID)?;

        Ok(match (access_token, refresh_token_id) {
            (Some(access_token), Some(refresh_token_id)) => Some(Credential {
                access_token,
                refresh_token_id,
            }),
            _ => None,
        })
    }

    /// Access token alone, for callers that only attach it.
    pub fn access_token(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::ACCESS_TOKEN)
    }

    /// Refresh handle alone.
    pub fn refresh_token_id(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::REFRESH_TOKEN_ID)
    }

    /// Replace the stored credential in one write.
    pub fn set(&self, credential: &Credential) -> StorageResult<()> {
        self.storage.set_many(&[
            (StorageKeys::ACCESS_TOKEN, credential.access_token.as_str()),
            (StorageKeys::REFRESH_TOKEN_ID, credential.refresh_token_id.as_str()),
        ])
    }

    /// Remove every session key, including ones written by other subsystems.
    pub fn clear(&self) -> StorageResult<()> {
        let removed = self.storage.clear()?;
        debug!(removed, "session storage cleared");
        Ok(())
    }

    pub fn set_login_info(&self, login_info: &serde_json::Value) -> StorageResult<()> {
        let json = serde_json::to_string(login_info)?;
        self.storage.set(StorageKeys::LOGIN_INFO, &json)
    }

    pub fn login_info(&self) -> StorageResult<Option<serde_json::Value>> {
        match self.storage.get(StorageKeys::LOGIN_INFO)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn set_user_email(&self, email: &str) -> StorageResult<()> {
        self.storage.set(StorageKeys::USER_EMAIL, email)
    }

    pub fn user_email(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::USER_EMAIL)
    }
}
