// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session state as persisted and as observed.

use super::user::User;
use serde::{Deserialize, Serialize};

/// A complete login: both tokens plus the user they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

/// Point-in-time view of the persisted session, any part of which may be absent.
///
/// A user record that failed validation is reported as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub access: Option<String>,
    pub refresh: Option<String>,
    pub user: Option<User>,
}

impl SessionSnapshot {
    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none() && self.user.is_none()
    }

    /// True when neither token is stored.
    pub fn has_no_tokens(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }
}

impl From<Session> for SessionSnapshot {
    fn from(session: Session) -> Self {
        Self {
            access: Some(session.access),
            refresh: Some(session.refresh),
            user: Some(session.user),
        }
    }
}

/// Change notifications broadcast by the session store.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A new session was created by login or signup.
    LoggedIn,
    /// The access token (and possibly the refresh token) was replaced.
    TokensRefreshed,
    /// The stored user record changed.
    UserUpdated,
    /// Both tokens and the active profile were replaced; dependent views re-fetch.
    ProfileSwitched,
    /// The session was destroyed.
    Cleared,
    /// The session could not be recovered and the user must login again.
    LoginRequired,
}
