// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session core configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default per-request timeout for API calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Refresh tokens proactively once fewer than this many seconds remain.
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Session core configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the GymGem REST API; endpoint paths are relative to it
    pub api_url: String,
    /// Client-side timeout applied to every request
    pub request_timeout: Duration,
    /// Remaining-lifetime threshold below which an access token is refreshed
    pub refresh_margin_secs: i64,
    /// File backing the persisted session, if any
    pub session_file: Option<PathBuf>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            refresh_margin_secs: DEFAULT_REFRESH_MARGIN_SECS,
            session_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_url = env::var("GYMGEM_API_URL")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("GYMGEM_API_URL"))?;
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::Invalid("GYMGEM_API_URL", api_url));
        }

        let request_timeout = match env::var("GYMGEM_REQUEST_TIMEOUT_SECS") {
            Ok(v) => v
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid("GYMGEM_REQUEST_TIMEOUT_SECS", v))?,
            Err(_) => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let refresh_margin_secs = match env::var("GYMGEM_REFRESH_MARGIN_SECS") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid("GYMGEM_REFRESH_MARGIN_SECS", v))?,
            Err(_) => DEFAULT_REFRESH_MARGIN_SECS,
        };

        Ok(Self {
            api_url,
            request_timeout,
            refresh_margin_secs,
            session_file: env::var_os("GYMGEM_SESSION_FILE").map(PathBuf::from),
        })
    }

    /// Resolve an endpoint path against the API base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("GYMGEM_API_URL", "https://api.gymgem.test/v1/");
        env::set_var("GYMGEM_REQUEST_TIMEOUT_SECS", "15");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.api_url, "https://api.gymgem.test/v1/");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.refresh_margin_secs, DEFAULT_REFRESH_MARGIN_SECS);
        assert_eq!(
            config.endpoint("/auth/login/"),
            "https://api.gymgem.test/v1/auth/login/"
        );
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = Config::default();
        assert_eq!(
            config.endpoint("auth/token/refresh/"),
            "http://localhost:8000/api/auth/token/refresh/"
        );
    }
}
