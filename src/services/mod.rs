// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - calls against the GymGem API.

pub mod api;
pub mod auth;
pub mod profile;
pub mod refresh;

pub use api::{ApiClient, ApiRequest};
pub use auth::AuthService;
pub use profile::ProfileSwitcher;
pub use refresh::RefreshCoordinator;

/// Header carrying the refresh token on refresh and logout calls.
pub const REFRESH_TOKEN_HEADER: &str = "X-Refresh-Token";

/// Endpoint paths relative to the API base URL.
pub mod paths {
    pub const REFRESH: &str = "auth/token/refresh/";
    pub const SWITCH_PROFILE: &str = "auth/switch-profile/";
    pub const LOGIN: &str = "auth/login/";
    pub const REGISTER: &str = "auth/register/";
    pub const LOGOUT: &str = "auth/logout/";
    /// Current user (GET) and account deletion (DELETE)
    pub const ME: &str = "auth/me/";
}
