// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Active profile switching.

use super::api::ApiClient;
use super::paths;
use crate::error::{Result, SessionError};
use crate::models::{ProfileId, User};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct SwitchProfileRequest {
    profile_id: ProfileId,
}

/// Profile-scoped tokens issued by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchProfileResponse {
    pub access: String,
    pub refresh: String,
}

/// Changes which profile is active for the session.
#[derive(Clone)]
pub struct ProfileSwitcher {
    api: ApiClient,
}

impl ProfileSwitcher {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Activate `target` and store the tokens the API issues for it.
    ///
    /// All or nothing: if the API call fails, the stored tokens and user are
    /// left exactly as they were. Subscribers receive
    /// [`SessionEvent::ProfileSwitched`](crate::models::SessionEvent) on success.
    pub async fn switch_profile(&self, target: ProfileId) -> Result<User> {
        let store = self.api.store();
        let user = store.user().ok_or(SessionError::AuthenticationExpired)?;

        if !user.holds(target) {
            return Err(SessionError::AuthorizationDenied(format!(
                "profile {} does not belong to user {}",
                target, user.id
            )));
        }
        if user.current_profile == Some(target) {
            return Ok(user);
        }

        let before = (store.access_token(), store.refresh_token());
        let tokens: SwitchProfileResponse = match self
            .api
            .post(paths::SWITCH_PROFILE, &SwitchProfileRequest { profile_id: target })
            .await
        {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(user_id = user.id, profile_id = %target, error = %e, "Profile switch failed");
                self.restore_unless_expired(&e, before);
                return Err(e);
            }
        };

        let updated = user.with_current_profile(target);
        store.store_switched(&tokens.access, &tokens.refresh, &updated)?;

        tracing::info!(user_id = updated.id, profile_id = %target, "Switched active profile");
        Ok(updated)
    }

    /// Undo a refresh made on the way to a failed switch. An expired session stays expired.
    fn restore_unless_expired(
        &self,
        error: &SessionError,
        (access, refresh): (Option<String>, Option<String>),
    ) {
        let store = self.api.store();
        let unchanged = store.access_token() == access && store.refresh_token() == refresh;
        if error.requires_login() || unchanged {
            return;
        }
        if let Err(e) = store.restore_tokens(access.as_deref(), refresh.as_deref()) {
            tracing::error!(error = %e, "Failed to restore tokens after profile switch");
        }
    }
}
