// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! GymGem session core
//!
//! This crate provides the client-side session lifecycle for the GymGem
//! marketplace: persisted tokens, local token validation, an API client that
//! keeps tokens fresh, route authorization, and profile switching.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod time_utils;
pub mod token;

use config::Config;
use error::Result;
use routes::RouteGuard;
use services::{ApiClient, AuthService, ProfileSwitcher};
use store::SessionStore;

/// Shared session state wired together from one configuration.
#[derive(Clone)]
pub struct SessionCore {
    pub store: SessionStore,
    pub api: ApiClient,
    pub auth: AuthService,
    pub profiles: ProfileSwitcher,
    pub guard: RouteGuard,
}

impl SessionCore {
    /// Build the core around an existing store.
    pub fn with_store(config: Config, store: SessionStore) -> Result<Self> {
        let api = ApiClient::new(config, store.clone())?;
        let guard = RouteGuard::new(store.clone(), *api.validator());

        Ok(Self {
            auth: AuthService::new(api.clone()),
            profiles: ProfileSwitcher::new(api.clone()),
            guard,
            store,
            api,
        })
    }

    /// Build the core with the storage backend the configuration names.
    pub fn new(config: Config) -> Result<Self> {
        let store = SessionStore::from_config(&config)?;
        tracing::info!(api_url = %config.api_url, "Session core initialized");
        Self::with_store(config, store)
    }
}
