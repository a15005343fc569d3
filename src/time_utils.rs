// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for clock values.

use chrono::{DateTime, Utc};

/// Current time as Unix seconds, the unit of the JWT `exp` claim.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Seconds from `now` until `exp`; zero or negative once expired.
pub fn seconds_until(exp: i64, now: DateTime<Utc>) -> i64 {
    exp - now.timestamp()
}
