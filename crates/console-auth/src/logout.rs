//! Logout: best-effort remote invalidation, then unconditional local teardown.

use crate::{AuthService, Navigator};
use console_storage::CredentialStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// What happened to the server-side session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteLogout {
    /// No complete credential was stored, so nothing was sent.
    Skipped,
    /// The service acknowledged the logout.
    Confirmed,
    /// The call failed or timed out. Local teardown still ran.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutOutcome {
    pub remote: RemoteLogout,
}

/// Ends sessions. Never fails: remote errors are logged and reported, not raised.
#[derive(Clone)]
pub struct LogoutService {
    store: CredentialStore,
    auth: Arc<dyn AuthService>,
    navigator: Arc<dyn Navigator>,
    remote_timeout: Duration,
}

impl LogoutService {
    pub fn new(
        store: CredentialStore,
        auth: Arc<dyn AuthService>,
        navigator: Arc<dyn Navigator>,
        remote_timeout: Duration,
    ) -> Self {
        Self {
            store,
            auth,
            navigator,
            remote_timeout,
        }
    }

    /// Invalidate the remote session if possible, then clear local state and
    /// redirect to sign-in.
    pub async fn logout(&self) -> LogoutOutcome {
        let remote = match self.store.get() {
            Ok(Some(credential)) => {
                match tokio::time::timeout(self.remote_timeout, self.auth.logout(&credential)).await
                {
                    Ok(Ok(())) => RemoteLogout::Confirmed,
                    Ok(Err(e)) => {
                        warn!(error = %e, "remote logout failed");
                        RemoteLogout::Failed(e.to_string())
                    }
                    Err(_) => {
                        warn!(
                            timeout_ms = self.remote_timeout.as_millis() as u64,
                            "remote logout timed out"
                        );
                        RemoteLogout::Failed("remote logout timed out".to_string())
                    }
                }
            }
            Ok(None) => RemoteLogout::Skipped,
            Err(e) => {
                warn!(error = %e, "could not read credential for remote logout");
                RemoteLogout::Skipped
            }
        };

        self.end_session_locally();
        LogoutOutcome { remote }
    }

    /// Clear every session key and redirect. Used directly when the refresh
    /// handle is already known to be invalid.
    pub fn end_session_locally(&self) {
        if let Err(e) = self.store.clear() {
            error!(error = %e, "failed to clear session storage");
        }
        self.navigator.redirect_to_login();
        info!("session ended");
    }
}
