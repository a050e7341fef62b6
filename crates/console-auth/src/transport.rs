//! Outbound calls to the analytics API.

use crate::auth_client::endpoint;
use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status and raw body of a completed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Parse the body, turning non-success statuses into [`AuthError::Api`].
    pub fn json<T: DeserializeOwned>(&self) -> AuthResult<T> {
        if !self.is_success() {
            return Err(AuthError::Api {
                status: self.status,
                body: self.body.clone(),
            });
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Executes one HTTP exchange. Knows nothing about refresh or retry.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn execute(&self, request: &ApiRequest, bearer: Option<&str>) -> AuthResult<ApiResponse>;
}

/// reqwest-backed [`ApiTransport`].
pub struct ReqwestTransport {
    http: Client,
    base_url: Url,
}

impl ReqwestTransport {
    pub fn new(base_url: Url) -> AuthResult<Self> {
        let http = Client::builder().cookie_store(true).build()?;
        Ok(Self { http, base_url })
    }

    fn url_for(&self, path: &str) -> AuthResult<Url> {
        let mut url = self.base_url.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            url = endpoint(&url, segment)?;
        }
        Ok(url)
    }
}

#[async_trait]
impl ApiTransport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest, bearer: Option<&str>) -> AuthResult<ApiResponse> {
        let url = self.url_for(&request.path)?;
        debug!(method = %request.method, url = %url, authenticated = bearer.is_some(), "api request");

        let mut builder = self.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, bytes = body.len(), "api response");

        Ok(ApiResponse { status, body })
    }
}
