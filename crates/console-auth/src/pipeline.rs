//! Authenticated request pipeline.
//!
//! Before send: refresh if the stored access token is expired, then attach
//! it as a bearer credential. After receipt: on 401, refresh once and retry
//! the original request once with the new token. The retry uses exactly the
//! credential the refresh produced and is never retried again.

use crate::claims::is_expired;
use crate::{ApiRequest, ApiResponse, ApiTransport, AuthError, AuthResult, RefreshCoordinator};
use console_storage::CredentialStore;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct RequestPipeline {
    store: CredentialStore,
    coordinator: RefreshCoordinator,
    transport: Arc<dyn ApiTransport>,
}

impl RequestPipeline {
    pub fn new(
        store: CredentialStore,
        coordinator: RefreshCoordinator,
        transport: Arc<dyn ApiTransport>,
    ) -> Self {
        Self {
            store,
            coordinator,
            transport,
        }
    }

    /// Send `request` with session handling.
    ///
    /// Non-401 responses are returned as-is, whatever their status. A second
    /// 401 after the retry becomes [`AuthError::Unauthorized`].
    pub async fn send(&self, request: &ApiRequest) -> AuthResult<ApiResponse> {
        let bearer = self.bearer_for_send().await?;
        let response = self.transport.execute(request, bearer.as_deref()).await?;

        if !response.is_unauthorized() {
            return Ok(response);
        }

        info!(path = %request.path, "request unauthorized, refreshing");
        let credential = self.coordinator.refresh().await?;

        let retried = self
            .transport
            .execute(request, Some(credential.access_token.as_str()))
            .await?;

        if retried.is_unauthorized() {
            warn!(path = %request.path, "request still unauthorized after refresh");
            return Err(AuthError::Unauthorized {
                status: retried.status,
                body: retried.body,
            });
        }

        Ok(retried)
    }

    /// Send and parse a JSON body. Non-success statuses become [`AuthError::Api`].
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> AuthResult<T> {
        self.send(request).await?.json()
    }

    async fn bearer_for_send(&self) -> AuthResult<Option<String>> {
        match self.store.get()? {
            Some(credential) if is_expired(Some(&credential.access_token)) => {
                debug!("access token expired before send");
                let refreshed = self.coordinator.refresh().await?;
                Ok(Some(refreshed.access_token))
            }
            Some(credential) => Ok(Some(credential.access_token)),
            None => Ok(None),
        }
    }
}
