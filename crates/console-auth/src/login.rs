//! Sign-in with an identity-provider token.

use crate::claims::decode_claims;
use crate::{AuthError, AuthResult, AuthService};
use console_storage::CredentialStore;
use std::sync::Arc;
use tracing::{info, warn};

const NO_ROLES_MESSAGE: &str = "You don't have access to this application.";
const ROLE_NOT_ALLOWED_MESSAGE: &str = "Access denied.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub email: Option<String>,
    pub roles: Vec<String>,
}

pub struct LoginService {
    store: CredentialStore,
    auth: Arc<dyn AuthService>,
    allowed_roles: Vec<String>,
}

impl LoginService {
    pub fn new(
        store: CredentialStore,
        auth: Arc<dyn AuthService>,
        allowed_roles: Vec<String>,
    ) -> Self {
        Self {
            store,
            auth,
            allowed_roles,
        }
    }

    /// Exchange `id_token` for a session and store it.
    ///
    /// Any failure leaves the session area empty.
    pub async fn login(&self, id_token: &str) -> AuthResult<LoginOutcome> {
        match self.try_login(id_token).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(error = %e, "login failed");
                if let Err(clear_err) = self.store.clear() {
                    warn!(error = %clear_err, "failed to clear session after login failure");
                }
                Err(e)
            }
        }
    }

    async fn try_login(&self, id_token: &str) -> AuthResult<LoginOutcome> {
        let email = decode_claims(id_token).and_then(|claims| claims.email);
        if let Some(email) = &email {
            self.store.set_user_email(email)?;
        }

        let grant = self.auth.login(id_token).await?;

        let roles = decode_claims(&grant.access_token)
            .map(|claims| claims.roles)
            .unwrap_or_default();

        if roles.is_empty() {
            return Err(AuthError::AccessDenied(NO_ROLES_MESSAGE.to_string()));
        }
        if !roles.iter().any(|role| self.allowed_roles.contains(role)) {
            return Err(AuthError::AccessDenied(ROLE_NOT_ALLOWED_MESSAGE.to_string()));
        }

        self.store.set(&grant.credential()?)?;
        self.store.set_login_info(&grant.to_login_info()?)?;

        info!(email = ?email, roles = roles.len(), "login succeeded");
        Ok(LoginOutcome { email, roles })
    }
}
