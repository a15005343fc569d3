// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use gymgem_session::config::Config;
use gymgem_session::models::{Profile, ProfileId, ProfileType, Session, User};
use gymgem_session::store::SessionStore;
use gymgem_session::time_utils::unix_now;
use gymgem_session::token::Claims;
use gymgem_session::SessionCore;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_JTI: AtomicU64 = AtomicU64::new(1);

/// Mint a token expiring `secs` from now. Every call yields a distinct token.
#[allow(dead_code)]
pub fn token_expiring_in(secs: i64) -> String {
    let now = unix_now();
    let claims = Claims {
        exp: now + secs,
        iat: Some(now),
        jti: Some(NEXT_JTI.fetch_add(1, Ordering::Relaxed).to_string()),
        token_type: Some("access".to_string()),
        user_id: Some(1),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"test_signing_key_32_bytes_long!!"),
    )
    .expect("Failed to create JWT")
}

#[allow(dead_code)]
pub fn valid_token() -> String {
    token_expiring_in(3600)
}

#[allow(dead_code)]
pub fn expired_token() -> String {
    token_expiring_in(-3600)
}

/// User holding `profiles`, with `current` active.
#[allow(dead_code)]
pub fn user_with(profiles: &[(ProfileType, u64)], current: Option<u64>) -> User {
    User {
        id: 1,
        username: "jordan".to_string(),
        email: "jordan@gymgem.test".to_string(),
        current_profile: current.map(ProfileId),
        profiles: profiles
            .iter()
            .map(|(profile_type, id)| Profile {
                profile_type: *profile_type,
                id: ProfileId(*id),
            })
            .collect(),
    }
}

/// A trainee-only user with the trainee profile active.
#[allow(dead_code)]
pub fn trainee() -> User {
    user_with(&[(ProfileType::Trainee, 1)], Some(1))
}

#[allow(dead_code)]
pub fn test_config(api_url: &str) -> Config {
    Config {
        api_url: api_url.to_string(),
        ..Config::default()
    }
}

/// Build a session core against a mock server with the given stored session.
#[allow(dead_code)]
pub fn core_with_session(api_url: &str, session: Option<Session>) -> SessionCore {
    let store = SessionStore::in_memory();
    if let Some(session) = session {
        store.store_session(&session).expect("Failed to seed session");
    }
    SessionCore::with_store(test_config(api_url), store).expect("Failed to build session core")
}

#[allow(dead_code)]
pub fn session(access: String, refresh: String, user: User) -> Session {
    Session {
        access,
        refresh,
        user,
    }
}
