// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle: login, signup, logout and account deletion.

use super::api::{check_response, check_response_json, ApiClient, ApiRequest};
use super::{paths, REFRESH_TOKEN_HEADER};
use crate::error::{Result, SessionError};
use crate::models::{Session, User};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Tokens and user returned by login and signup.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

impl AuthResponse {
    fn into_session(self) -> Result<Session> {
        self.user
            .validate()
            .map_err(|e| SessionError::InvalidResponse(format!("user record: {e}")))?;
        Ok(Session {
            access: self.access,
            refresh: self.refresh,
            user: self.user,
        })
    }
}

/// Creates and destroys sessions.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Log in with credentials. The session is untouched on failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let request = ApiRequest::post(paths::LOGIN)
            .anonymous()
            .json(&LoginRequest { username, password })?;
        let response: AuthResponse = self.api.send_json(request).await?;

        let session = response.into_session()?;
        self.api.store().store_session(&session)?;
        tracing::info!(user_id = session.user.id, "Logged in");
        Ok(session.user)
    }

    /// Create an account and start a session for it.
    pub async fn signup(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let request = ApiRequest::post(paths::REGISTER)
            .anonymous()
            .json(&SignupRequest {
                username,
                email,
                password,
            })?;
        let response: AuthResponse = self.api.send_json(request).await?;

        let session = response.into_session()?;
        self.api.store().store_session(&session)?;
        tracing::info!(user_id = session.user.id, "Signed up");
        Ok(session.user)
    }

    /// Invalidate the refresh token server-side and clear the local session.
    ///
    /// The local session is cleared whether or not the API call succeeds.
    pub async fn logout(&self) -> Result<()> {
        if let Some(refresh) = self.api.store().refresh_token() {
            let request = ApiRequest::post(paths::LOGOUT)
                .anonymous()
                .header(REFRESH_TOKEN_HEADER, refresh);

            let outcome = match self.api.send(request).await {
                Ok(response) => check_response(response).await.map(|_| ()),
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                tracing::warn!(error = %e, "Server-side logout failed, clearing local session anyway");
            }
        }

        self.api.store().clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Delete the account. The session is cleared only once the API confirms.
    pub async fn delete_account(&self) -> Result<()> {
        self.api.delete(paths::ME).await?;
        self.api.store().clear()?;
        tracing::info!("Account deleted");
        Ok(())
    }

    /// Re-fetch the user record from the API and store it.
    pub async fn reload_user(&self) -> Result<User> {
        let response = self.api.send(ApiRequest::get(paths::ME)).await?;
        let user: User = check_response_json(response).await?;
        user.validate()
            .map_err(|e| SessionError::InvalidResponse(format!("user record: {e}")))?;

        self.api.store().store_user(&user)?;
        Ok(user)
    }
}
