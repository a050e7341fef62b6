//! Authentication error types.

use std::sync::Arc;
use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No credential or refresh handle is stored
    #[error("Not logged in")]
    NotLoggedIn,

    /// Login succeeded upstream but the operator lacks a permitted role
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// A data call was still rejected after one refresh-and-retry cycle
    #[error("Unauthorized (HTTP {status}): {body}")]
    Unauthorized { status: u16, body: String },

    /// Non-success response from the analytics API
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Non-success response from the authentication service
    #[error("Auth service {operation} failed (HTTP {status}): {body}")]
    AuthService {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Authentication service answered 2xx with an unusable body
    #[error("Invalid auth service response: {0}")]
    InvalidResponse(String),

    /// The shared refresh attempt failed; the session has been torn down.
    /// Every caller that joined the attempt sees the same cause.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(#[source] Arc<AuthError>),

    /// Invalid state transition in a refresh or gate machine
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] console_storage::StorageError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Returns true if this error is transient and the operation could succeed later.
    ///
    /// Informational only: a failed refresh is never retried automatically.
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Timeout => true,
            AuthError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            AuthError::Api { status, .. } | AuthError::AuthService { status, .. } => {
                *status >= 500
            }
            AuthError::RefreshFailed(cause) => cause.is_transient(),
            _ => false,
        }
    }

    /// Returns true if the session was ended because of this error.
    pub fn ended_session(&self) -> bool {
        matches!(self, AuthError::RefreshFailed(_))
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
