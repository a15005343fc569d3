// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Single-flight access token refresh.
//!
//! At most one refresh call is outstanding at any time. Callers that arrive
//! while it is pending share its outcome: all of them get the new token, or
//! all of them fail and the session is destroyed.

use super::api::check_response_json;
use super::{paths, REFRESH_TOKEN_HEADER};
use crate::config::Config;
use crate::error::{Result, SessionError};
use crate::store::SessionStore;
use crate::token::TokenValidator;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Refresh response from the API.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    /// Present when the API rotates refresh tokens
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Cloneable failure shared by every caller of one refresh cycle.
#[derive(Debug, Clone)]
struct RefreshFailure(String);

type RefreshFlight = Shared<BoxFuture<'static, std::result::Result<String, RefreshFailure>>>;

/// Coalesces concurrent refresh requests into one network call.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    config: Arc<Config>,
    store: SessionStore,
    validator: TokenValidator,
    /// The refresh cycle currently in flight, if any.
    in_flight: Mutex<Option<RefreshFlight>>,
}

impl RefreshCoordinator {
    pub fn new(
        http: reqwest::Client,
        config: Arc<Config>,
        store: SessionStore,
        validator: TokenValidator,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                config,
                store,
                validator,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Obtain a fresh access token to replace `stale`.
    ///
    /// If the stored access token already differs from `stale` and is not due
    /// for refresh, another caller has refreshed in the meantime and that
    /// token is returned without a network call.
    pub async fn refresh(&self, stale: Option<&str>) -> Result<String> {
        let flight = {
            let mut slot = self.inner.in_flight.lock().await;
            match slot.as_ref() {
                Some(flight) => {
                    tracing::debug!("Joining in-flight token refresh");
                    flight.clone()
                }
                None => {
                    if let Some(current) = self.inner.store.access_token() {
                        if stale != Some(current.as_str())
                            && !self.inner.validator.status(&current).needs_refresh()
                        {
                            return Ok(current);
                        }
                    }

                    let inner = self.inner.clone();
                    let flight = async move { inner.run().await }.boxed().shared();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };

        flight
            .await
            .map_err(|RefreshFailure(reason)| SessionError::RefreshFailed(reason))
    }

    /// True while a refresh call is outstanding.
    pub async fn is_refreshing(&self) -> bool {
        self.inner.in_flight.lock().await.is_some()
    }
}

impl Inner {
    /// One refresh cycle. The session is updated before the in-flight slot
    /// is cleared, so later callers always see this cycle's outcome.
    async fn run(self: Arc<Self>) -> std::result::Result<String, RefreshFailure> {
        let outcome = match self.refresh_once().await {
            // A token that could not be persisted is lost on the next read,
            // and a rotated refresh token with it.
            Ok(response) => self
                .store
                .store_refreshed(&response.access, response.refresh.as_deref())
                .map(|()| response.access),
            Err(e) => Err(e),
        };

        let outcome = match outcome {
            Ok(access) => {
                tracing::info!("Access token refreshed");
                Ok(access)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, clearing session");
                self.store.expire();
                Err(RefreshFailure(e.to_string()))
            }
        };

        *self.in_flight.lock().await = None;
        outcome
    }

    async fn refresh_once(&self) -> Result<RefreshResponse> {
        let refresh_token = self
            .store
            .refresh_token()
            .ok_or(SessionError::AuthenticationExpired)?;

        // A corrupted or expired refresh token is never sent.
        if !self.validator.status(&refresh_token).is_usable() {
            return Err(SessionError::AuthenticationExpired);
        }

        let response = self
            .http
            .post(self.config.endpoint(paths::REFRESH))
            .header(REFRESH_TOKEN_HEADER, refresh_token)
            .send()
            .await?;

        check_response_json(response).await
    }
}
