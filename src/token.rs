// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local token inspection.
//!
//! The client holds no signing key, so tokens are decoded without signature
//! verification; the API stays the authority on whether a token is accepted.
//! A token that cannot be decoded is reported as [`TokenStatus::Expired`],
//! so a corrupted token is never sent as if it were good.

use crate::config::DEFAULT_REFRESH_MARGIN_SECS;
use crate::error::TokenDecodeError;
use crate::time_utils::seconds_until;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by GymGem access and refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub jti: Option<String>,
    /// "access" or "refresh"
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<u64>,
}

/// Decode a token's claims without contacting the API.
pub fn decode(token: &str) -> Result<Claims, TokenDecodeError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    // Expiry is computed by the caller so that "expiring soon" can be told apart.
    validation.validate_exp = false;
    validation.validate_aud = false;

    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| TokenDecodeError(e.to_string()))
}

/// Seconds until the token expires; zero or negative means expired.
pub fn time_remaining(token: &str) -> Result<i64, TokenDecodeError> {
    time_remaining_at(token, Utc::now())
}

/// [`time_remaining`] against an explicit clock.
pub fn time_remaining_at(token: &str, now: DateTime<Utc>) -> Result<i64, TokenDecodeError> {
    Ok(seconds_until(decode(token)?.exp, now))
}

/// How a stored token should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// Usable, with more than the refresh margin left.
    Valid { remaining_secs: i64 },
    /// Still usable, but inside the refresh margin.
    ExpiringSoon { remaining_secs: i64 },
    /// Expired or undecodable.
    Expired,
}

impl TokenStatus {
    /// True while the token may still be sent.
    pub fn is_usable(&self) -> bool {
        !matches!(self, TokenStatus::Expired)
    }

    /// True when a fresh token should be obtained before use.
    pub fn needs_refresh(&self) -> bool {
        !matches!(self, TokenStatus::Valid { .. })
    }
}

/// The single place token validity is decided.
#[derive(Debug, Clone, Copy)]
pub struct TokenValidator {
    refresh_margin_secs: i64,
}

impl Default for TokenValidator {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_MARGIN_SECS)
    }
}

impl TokenValidator {
    pub fn new(refresh_margin_secs: i64) -> Self {
        Self {
            refresh_margin_secs,
        }
    }

    pub fn refresh_margin_secs(&self) -> i64 {
        self.refresh_margin_secs
    }

    pub fn status(&self, token: &str) -> TokenStatus {
        self.status_at(token, Utc::now())
    }

    pub fn status_at(&self, token: &str, now: DateTime<Utc>) -> TokenStatus {
        match time_remaining_at(token, now) {
            Ok(remaining_secs) if remaining_secs <= 0 => TokenStatus::Expired,
            Ok(remaining_secs) if remaining_secs < self.refresh_margin_secs => {
                TokenStatus::ExpiringSoon { remaining_secs }
            }
            Ok(remaining_secs) => TokenStatus::Valid { remaining_secs },
            Err(e) => {
                tracing::debug!(error = %e, "Treating undecodable token as expired");
                TokenStatus::Expired
            }
        }
    }

    /// Status of an optional token; a missing token is expired.
    pub fn status_of(&self, token: Option<&str>, now: DateTime<Utc>) -> TokenStatus {
        token.map_or(TokenStatus::Expired, |t| self.status_at(t, now))
    }

    /// Decodable and not yet expired.
    pub fn is_valid(&self, token: &str) -> bool {
        self.status(token).is_usable()
    }

    /// Undecodable, expired, or inside the refresh margin.
    pub fn needs_refresh(&self, token: &str) -> bool {
        self.status(token).needs_refresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_expiring_in(secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            exp: now + secs,
            iat: Some(now),
            jti: Some("abc".to_string()),
            token_type: Some("access".to_string()),
            user_id: Some(7),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"server_side_key_we_never_see!!!!"),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_reads_claims_without_key() {
        let token = token_expiring_in(3600);
        let claims = decode(&token).unwrap();
        assert_eq!(claims.user_id, Some(7));
        assert_eq!(claims.token_type.as_deref(), Some("access"));
    }

    #[test]
    fn test_decode_rejects_corrupted_tokens() {
        let token = token_expiring_in(3600);
        let mut corrupted = token.clone();
        corrupted.insert_str(token.find('.').unwrap() + 1, "!!");

        assert!(decode("").is_err());
        assert!(decode("not-a-token").is_err());
        assert!(decode("a.b.c").is_err());
        assert!(decode(&corrupted).is_err());
    }

    #[test]
    fn test_decode_requires_exp() {
        #[derive(Serialize)]
        struct NoExp {
            user_id: u64,
        }
        let token = encode(
            &Header::default(),
            &NoExp { user_id: 1 },
            &EncodingKey::from_secret(b"k"),
        )
        .unwrap();
        assert!(decode(&token).is_err());
    }

    #[test]
    fn test_time_remaining() {
        let token = token_expiring_in(600);
        let remaining = time_remaining(&token).unwrap();
        assert!((595..=600).contains(&remaining));

        let expired = token_expiring_in(-10);
        assert!(time_remaining(&expired).unwrap() <= 0);
        assert!(time_remaining("garbage").is_err());
    }

    #[test]
    fn test_status_thresholds() {
        let validator = TokenValidator::default();

        assert!(matches!(
            validator.status(&token_expiring_in(3600)),
            TokenStatus::Valid { .. }
        ));
        assert!(matches!(
            validator.status(&token_expiring_in(120)),
            TokenStatus::ExpiringSoon { .. }
        ));
        assert_eq!(validator.status(&token_expiring_in(0)), TokenStatus::Expired);
        assert_eq!(validator.status(&token_expiring_in(-60)), TokenStatus::Expired);

        let expiring = token_expiring_in(120);
        assert!(validator.is_valid(&expiring));
        assert!(validator.needs_refresh(&expiring));
        assert!(!validator.needs_refresh(&token_expiring_in(3600)));
        assert!(!validator.is_valid("garbage"));
    }

    #[test]
    fn test_undecodable_is_indistinguishable_from_expired() {
        let validator = TokenValidator::default();
        let now = Utc::now();

        for bad in ["", "x.y.z", "eyJhbGciOiJIUzI1NiJ9.e30.sig"] {
            let status = validator.status_at(bad, now);
            assert_eq!(status, validator.status_at(&token_expiring_in(-1), now));
            assert!(!status.is_usable());
            assert!(status.needs_refresh());
        }
        assert_eq!(validator.status_of(None, now), TokenStatus::Expired);
    }

    #[test]
    fn test_status_at_explicit_clock() {
        let validator = TokenValidator::new(300);
        let token = token_expiring_in(3600);
        let later = Utc::now() + Duration::seconds(3500);

        assert!(matches!(
            validator.status_at(&token, later),
            TokenStatus::ExpiringSoon { .. }
        ));
        assert_eq!(
            validator.status_at(&token, later + Duration::seconds(200)),
            TokenStatus::Expired
        );
    }
}
