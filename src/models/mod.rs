// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the session core.

pub mod session;
pub mod user;

pub use session::{Session, SessionEvent, SessionSnapshot};
pub use user::{Profile, ProfileId, ProfileType, User, UserRecordError};
