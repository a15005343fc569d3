// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Navigation authorization.

pub mod guard;

pub use guard::{
    evaluate, GuardDecision, Navigation, Notice, Notifier, RoleSelection, RouteGuard,
    RouteRequirement, SessionStatus, TracingNotifier,
};

/// Login page.
pub const LOGIN: &str = "/login";
/// Home page, where profile switching happens.
pub const HOME: &str = "/";
/// Select or create a role (profile).
pub const ROLE: &str = "/role";
