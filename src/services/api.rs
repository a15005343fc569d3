// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GymGem API client.
//!
//! Handles:
//! - Attaching a fresh access token to every authenticated request
//! - Proactive refresh when the token is about to expire
//! - One transparent retry after a `401 Unauthorized`
//! - Mapping error statuses to [`SessionError`]

use super::refresh::RefreshCoordinator;
use crate::config::Config;
use crate::error::{Result, SessionError};
use crate::store::SessionStore;
use crate::token::{TokenStatus, TokenValidator};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// A replayable description of an API call.
///
/// Kept separate from `reqwest::RequestBuilder` so the retry after a
/// refresh sends exactly the same request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    authenticated: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            authenticated: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let body = serde_json::to_value(body).map_err(|e| SessionError::Internal(e.into()))?;
        self.body = Some(body);
        Ok(self)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Send without credentials and never refresh on `401` (login, signup, logout).
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// HTTP client wrapper that keeps the session's access token fresh.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<Config>,
    store: SessionStore,
    validator: TokenValidator,
    refresher: RefreshCoordinator,
}

impl ApiClient {
    /// Create a client that reads and updates tokens in `store`.
    pub fn new(config: Config, store: SessionStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let validator = TokenValidator::new(config.refresh_margin_secs);
        let config = Arc::new(config);
        let refresher =
            RefreshCoordinator::new(http.clone(), config.clone(), store.clone(), validator);

        Ok(Self {
            http,
            config,
            store,
            validator,
            refresher,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    pub fn refresher(&self) -> &RefreshCoordinator {
        &self.refresher
    }

    // ─── Request Pipeline ────────────────────────────────────────────────────

    /// Send a request, refreshing and retrying once on `401 Unauthorized`.
    ///
    /// The raw response is returned whatever its status; use
    /// [`check_response`] or the typed helpers to turn failures into errors.
    pub async fn send(&self, request: ApiRequest) -> Result<reqwest::Response> {
        let token = if request.authenticated {
            self.authorize().await?
        } else {
            None
        };

        let response = self.execute(&request, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED || !request.authenticated {
            return Ok(response);
        }

        // Sent without an access token: recoverable only through a stored refresh token.
        if token.is_none() && self.store.refresh_token().is_none() {
            return Ok(response);
        }

        tracing::info!(
            method = %request.method,
            path = %request.path,
            had_token = token.is_some(),
            "Request rejected, refreshing before retry"
        );
        let fresh = self.refresher.refresh(token.as_deref()).await?;

        // Retried at most once; a second 401 goes back to the caller.
        self.execute(&request, Some(&fresh)).await
    }

    /// Access token to attach, refreshing first if it is expired,
    /// undecodable, or inside the refresh margin.
    async fn authorize(&self) -> Result<Option<String>> {
        let Some(access) = self.store.access_token() else {
            return Ok(None);
        };

        match self.validator.status(&access) {
            TokenStatus::Valid { .. } => Ok(Some(access)),
            status => {
                tracing::debug!(?status, "Refreshing access token before request");
                self.refresher.refresh(Some(&access)).await.map(Some)
            }
        }
    }

    async fn execute(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.config.endpoint(&request.path));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = %response.status(),
            "API response"
        );
        Ok(response)
    }

    // ─── Typed Helpers ───────────────────────────────────────────────────────

    /// Send and parse a JSON response body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        check_response_json(response).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let response = self.send(ApiRequest::delete(path)).await?;
        check_response(response).await?;
        Ok(())
    }
}

/// Check response status and return error if not successful.
pub async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED {
        tracing::warn!("API rejected credentials (401)");
    }

    Err(SessionError::Api { status, body })
}

/// Check response and parse JSON body.
pub async fn check_response_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let response = check_response(response).await?;
    response
        .json()
        .await
        .map_err(|e| SessionError::InvalidResponse(e.to_string()))
}
