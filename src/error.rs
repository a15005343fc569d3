// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session error types.
//!
//! Decode failures and expiry are resolved locally by refreshing; only the
//! variants that need the user's attention reach the UI layer.

use crate::models::ProfileType;
use reqwest::StatusCode;

/// A token string that could not be decoded locally.
///
/// Callers must treat this exactly like an expired token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Token could not be decoded: {0}")]
pub struct TokenDecodeError(pub String);

/// Errors surfaced by the session core.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    TokenDecode(#[from] TokenDecodeError),

    #[error("Authentication expired, please login again")]
    AuthenticationExpired,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Profile not available: {0}")]
    AuthorizationDenied(String),

    #[error("API error (HTTP {status}): {body}")]
    Api { status: StatusCode, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl SessionError {
    /// Message shown when a session can no longer be recovered.
    pub const SESSION_EXPIRED_NOTICE: &'static str =
        "Your session has expired. Please login again.";

    /// Build the denial error for a missing or inactive profile type.
    pub fn profile_required(profile_type: ProfileType) -> Self {
        SessionError::AuthorizationDenied(format!("{} profile required", profile_type))
    }

    /// True for errors whose only remedy is logging in again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            SessionError::AuthenticationExpired | SessionError::RefreshFailed(_)
        )
    }

    /// True when the API rejected the request's credentials.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            SessionError::Api { status, .. } => *status == StatusCode::UNAUTHORIZED,
            SessionError::TokenDecode(_) => true,
            other => other.requires_login(),
        }
    }
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_login() {
        assert!(SessionError::AuthenticationExpired.requires_login());
        assert!(SessionError::RefreshFailed("gone".into()).requires_login());
        assert!(!SessionError::profile_required(ProfileType::Trainer).requires_login());
        assert!(!SessionError::Storage("disk full".into()).requires_login());
    }

    #[test]
    fn test_is_auth_failure() {
        let err = SessionError::Api {
            status: StatusCode::UNAUTHORIZED,
            body: String::new(),
        };
        assert!(err.is_auth_failure());

        let err = SessionError::Api {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };
        assert!(!err.is_auth_failure());

        let err = SessionError::from(TokenDecodeError("bad segment".into()));
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_authorization_denied_message() {
        let err = SessionError::profile_required(ProfileType::Gym);
        assert_eq!(err.to_string(), "Profile not available: gym profile required");
    }
}
