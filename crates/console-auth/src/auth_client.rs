//! Client for the role-based authentication service.
//!
//! Login and refresh share one endpoint (`POST {auth_url}/login`) and are
//! told apart by `requestType`. Logout is `POST {auth_url}/logout` with the
//! access token as a bearer credential.

use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use console_storage::Credential;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};
use url::Url;

/// Authentication service operations the session layer depends on.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange an identity-provider token for a session.
    async fn login(&self, id_token: &str) -> AuthResult<TokenGrant>;

    /// Obtain a fresh credential using the stored refresh handle.
    async fn refresh(&self, refresh_token_id: &str) -> AuthResult<TokenGrant>;

    /// Invalidate the session server-side.
    async fn logout(&self, credential: &Credential) -> AuthResult<()>;
}

/// Successful login or refresh response.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token_id: String,
    /// Any additional profile fields the service returns.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenGrant {
    pub fn new(access_token: impl Into<String>, refresh_token_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token_id: refresh_token_id.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Convert into a storable credential, rejecting grants missing either half.
    pub fn credential(&self) -> AuthResult<Credential> {
        if self.access_token.is_empty() || self.refresh_token_id.is_empty() {
            return Err(AuthError::InvalidResponse(
                "response is missing accessToken or refreshTokenId".to_string(),
            ));
        }
        Ok(Credential::new(&self.access_token, &self.refresh_token_id))
    }

    /// The full response as JSON, kept under the login info key.
    pub fn to_login_info(&self) -> AuthResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token_id", &"[REDACTED]")
            .field("extra_keys", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum RequestType {
    Login,
    Refresh,
    Logout,
}

impl RequestType {
    fn operation(self) -> &'static str {
        match self {
            RequestType::Login => "login",
            RequestType::Refresh => "refresh",
            RequestType::Logout => "logout",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthRequest<'a> {
    application_id: &'a str,
    request_type: RequestType,
    #[serde(skip_serializing_if = "Option::is_none")]
    id_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token_id: Option<&'a str>,
}

/// Append a path segment to a base URL, keeping any existing path.
pub(crate) fn endpoint(base: &Url, segment: &str) -> AuthResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| AuthError::Config(format!("{} cannot be used as a base URL", base)))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

/// reqwest-backed [`AuthService`].
pub struct RbacAuthClient {
    http: Client,
    login_url: Url,
    logout_url: Url,
    application_id: String,
}

impl RbacAuthClient {
    /// Create a client for the service rooted at `auth_url`.
    ///
    /// The cookie store is enabled so session cookies set by the service are
    /// sent back on later calls.
    pub fn new(auth_url: &Url, application_id: impl Into<String>) -> AuthResult<Self> {
        let http = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            login_url: endpoint(auth_url, "login")?,
            logout_url: endpoint(auth_url, "logout")?,
            application_id: application_id.into(),
        })
    }

    fn request<'a>(
        &'a self,
        request_type: RequestType,
        id_token: Option<&'a str>,
        refresh_token_id: Option<&'a str>,
    ) -> AuthRequest<'a> {
        AuthRequest {
            application_id: &self.application_id,
            request_type,
            id_token,
            refresh_token_id,
        }
    }

    async fn post_login(&self, body: &AuthRequest<'_>) -> AuthResult<TokenGrant> {
        let operation = body.request_type.operation();
        debug!(url = %self.login_url, operation, "calling auth service");

        let response = self
            .http
            .post(self.login_url.clone())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(operation, status = %status, "auth service rejected request");
            return Err(AuthError::AuthService {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl AuthService for RbacAuthClient {
    async fn login(&self, id_token: &str) -> AuthResult<TokenGrant> {
        let body = self.request(RequestType::Login, Some(id_token), None);
        self.post_login(&body).await
    }

    async fn refresh(&self, refresh_token_id: &str) -> AuthResult<TokenGrant> {
        let body = self.request(RequestType::Refresh, None, Some(refresh_token_id));
        let grant = self.post_login(&body).await?;
        // A 2xx without both halves cannot be stored.
        grant.credential()?;
        Ok(grant)
    }

    async fn logout(&self, credential: &Credential) -> AuthResult<()> {
        let body = self.request(
            RequestType::Logout,
            None,
            Some(credential.refresh_token_id.as_str()),
        );

        let response = self
            .http
            .post(self.logout_url.clone())
            .bearer_auth(&credential.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::AuthService {
                operation: "logout",
                status: status.as_u16(),
                body,
            });
        }

        debug!("remote session invalidated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_keeps_base_path() {
        let base = Url::parse("https://api-rbac.dev.supportninja.com/rbac").unwrap();
        assert_eq!(
            endpoint(&base, "login").unwrap().as_str(),
            "https://api-rbac.dev.supportninja.com/rbac/login"
        );

        let trailing = Url::parse("https://auth.example.com/rbac/").unwrap();
        assert_eq!(
            endpoint(&trailing, "logout").unwrap().as_str(),
            "https://auth.example.com/rbac/logout"
        );
    }

    #[test]
    fn endpoint_rejects_cannot_be_base() {
        let base = Url::parse("mailto:ops@example.com").unwrap();
        assert!(matches!(endpoint(&base, "login"), Err(AuthError::Config(_))));
    }

    #[test]
    fn request_bodies_match_service_contract() {
        let client = RbacAuthClient::new(
            &Url::parse("https://auth.example.com/rbac").unwrap(),
            "digital_qa",
        )
        .unwrap();

        let refresh = serde_json::to_value(client.request(RequestType::Refresh, None, Some("r-1")))
            .unwrap();
        assert_eq!(
            refresh,
            json!({"applicationId": "digital_qa", "requestType": "refresh", "refreshTokenId": "r-1"})
        );

        let login =
            serde_json::to_value(client.request(RequestType::Login, Some("id-tok"), None)).unwrap();
        assert_eq!(
            login,
            json!({"applicationId": "digital_qa", "requestType": "login", "idToken": "id-tok"})
        );

        let logout = serde_json::to_value(client.request(RequestType::Logout, None, Some("r-2")))
            .unwrap();
        assert_eq!(logout["requestType"], "logout");
        assert_eq!(logout["refreshTokenId"], "r-2");
    }

    #[test]
    fn grant_keeps_extra_fields() {
        let grant: TokenGrant = serde_json::from_value(json!({
            "accessToken": "a.b.c",
            "refreshTokenId": "r-1",
            "name": "Ana"
        }))
        .unwrap();

        assert_eq!(grant.credential().unwrap(), Credential::new("a.b.c", "r-1"));
        let info = grant.to_login_info().unwrap();
        assert_eq!(info["name"], "Ana");
        assert_eq!(info["accessToken"], "a.b.c");
    }

    #[test]
    fn incomplete_grant_is_rejected() {
        let grant: TokenGrant = serde_json::from_value(json!({"accessToken": "a.b.c"})).unwrap();
        assert!(matches!(grant.credential(), Err(AuthError::InvalidResponse(_))));
    }

    #[test]
    fn grant_debug_hides_tokens() {
        let rendered = format!("{:?}", TokenGrant::new("tok-value", "handle-value"));
        assert!(!rendered.contains("tok-value"));
        assert!(!rendered.contains("handle-value"));
    }
}
