// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route guard for profile-gated pages.
//!
//! [`evaluate`] is a pure function of the session snapshot and the clock;
//! [`RouteGuard`] applies its decision (clearing the session, showing a
//! notice) for one navigation.

use super::{HOME, LOGIN, ROLE};
use crate::error::SessionError;
use crate::models::{ProfileType, SessionSnapshot};
use crate::store::SessionStore;
use crate::token::{TokenStatus, TokenValidator};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// What a page demands of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteRequirement {
    pub required_profile: Option<ProfileType>,
}

impl RouteRequirement {
    /// Any logged-in user.
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// A logged-in user whose active profile is `profile_type`.
    pub fn profile(profile_type: ProfileType) -> Self {
        Self {
            required_profile: Some(profile_type),
        }
    }
}

/// Transient user-facing notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    SessionExpired,
    SessionFullyExpired,
    SwitchProfile(ProfileType),
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::SessionExpired => SessionError::SESSION_EXPIRED_NOTICE.to_string(),
            Notice::SessionFullyExpired => {
                "Your session has fully expired. Please login again.".to_string()
            }
            Notice::SwitchProfile(profile_type) => format!(
                "Switch to your {} profile to access this page.",
                profile_type
            ),
        }
    }
}

/// Navigation state carried to the role page so the user can return afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSelection {
    /// Page the user was trying to reach
    pub from: String,
    pub required: ProfileType,
}

/// Outcome of evaluating a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    /// Clear the session and go to the login page.
    Login { notice: Option<Notice> },
    /// The user holds no profile of the required type.
    CreateProfile(RoleSelection),
    /// The user holds the required profile but another one is active.
    SwitchProfile { required: ProfileType },
}

impl GuardDecision {
    pub fn is_render(&self) -> bool {
        matches!(self, GuardDecision::Render)
    }

    /// Page to redirect to, if any.
    pub fn target(&self) -> Option<&'static str> {
        match self {
            GuardDecision::Render => None,
            GuardDecision::Login { .. } => Some(LOGIN),
            GuardDecision::CreateProfile(_) => Some(ROLE),
            GuardDecision::SwitchProfile { .. } => Some(HOME),
        }
    }

    /// Full redirect location, with the role selection encoded as query parameters.
    pub fn location(&self) -> Option<String> {
        match self {
            GuardDecision::CreateProfile(selection) => Some(format!(
                "{}?from={}&required={}",
                ROLE,
                urlencoding::encode(&selection.from),
                selection.required
            )),
            other => other.target().map(str::to_string),
        }
    }

    pub fn notice(&self) -> Option<Notice> {
        match self {
            GuardDecision::Login { notice } => *notice,
            GuardDecision::SwitchProfile { required } => Some(Notice::SwitchProfile(*required)),
            GuardDecision::Render | GuardDecision::CreateProfile(_) => None,
        }
    }

    pub fn clears_session(&self) -> bool {
        matches!(self, GuardDecision::Login { .. })
    }

    /// The error equivalent of a redirect, for callers that propagate errors.
    pub fn denial(&self) -> Option<SessionError> {
        match self {
            GuardDecision::Render => None,
            GuardDecision::Login { .. } => Some(SessionError::AuthenticationExpired),
            GuardDecision::CreateProfile(RoleSelection { required, .. })
            | GuardDecision::SwitchProfile { required } => {
                Some(SessionError::profile_required(*required))
            }
        }
    }
}

/// Decide whether `path` may render for the given session.
///
/// First match wins:
/// 1. no tokens at all → login, "session expired"
/// 2. neither token usable → login, "fully expired"
/// 3. only the refresh token usable → carry on; the API client refreshes
/// 4. no valid user record → login, no notice
/// 5. required profile type not held → role page
/// 6. required profile held but not active → home, "switch profile"
/// 7. render
pub fn evaluate(
    snapshot: &SessionSnapshot,
    path: &str,
    requirement: RouteRequirement,
    validator: &TokenValidator,
    now: DateTime<Utc>,
) -> GuardDecision {
    if snapshot.has_no_tokens() {
        return GuardDecision::Login {
            notice: Some(Notice::SessionExpired),
        };
    }

    let access = validator.status_of(snapshot.access.as_deref(), now);
    let refresh = validator.status_of(snapshot.refresh.as_deref(), now);
    if !access.is_usable() && !refresh.is_usable() {
        return GuardDecision::Login {
            notice: Some(Notice::SessionFullyExpired),
        };
    }

    let Some(user) = &snapshot.user else {
        return GuardDecision::Login { notice: None };
    };

    let Some(required) = requirement.required_profile else {
        return GuardDecision::Render;
    };

    if user.profile_of_type(required).is_none() {
        return GuardDecision::CreateProfile(RoleSelection {
            from: path.to_string(),
            required,
        });
    }

    if !user.is_active_as(required) {
        return GuardDecision::SwitchProfile { required };
    }

    GuardDecision::Render
}

/// Where toasts go. A UI shows them; the default just logs.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Notifier that records notices in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        tracing::info!(message = %notice.message(), "User notice");
    }
}

/// One navigation event. At most one notice is delivered per navigation.
#[derive(Debug, Clone)]
pub struct Navigation {
    path: String,
    notified: bool,
}

impl Navigation {
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            notified: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn notice_shown(&self) -> bool {
        self.notified
    }
}

/// Login state reported by the per-navigation session check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Nothing stored.
    Anonymous,
    /// The access token is good.
    Active,
    /// The access token is expired or expiring; the refresh token is good.
    NeedsRefresh,
    /// Both tokens unusable; the session was cleared.
    Expired,
}

/// Applies guard decisions to the session for each navigation.
#[derive(Clone)]
pub struct RouteGuard {
    store: SessionStore,
    validator: TokenValidator,
    notifier: Arc<dyn Notifier>,
}

impl RouteGuard {
    pub fn new(store: SessionStore, validator: TokenValidator) -> Self {
        Self::with_notifier(store, validator, Arc::new(TracingNotifier))
    }

    pub fn with_notifier(
        store: SessionStore,
        validator: TokenValidator,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            validator,
            notifier,
        }
    }

    /// Evaluate `navigation` against the stored session without side effects.
    pub fn decide(&self, navigation: &Navigation, requirement: RouteRequirement) -> GuardDecision {
        evaluate(
            &self.store.snapshot(),
            navigation.path(),
            requirement,
            &self.validator,
            Utc::now(),
        )
    }

    /// Evaluate and apply: clear the session if required and show the notice.
    pub fn check(
        &self,
        navigation: &mut Navigation,
        requirement: RouteRequirement,
    ) -> GuardDecision {
        let decision = self.decide(navigation, requirement);

        if decision.clears_session() {
            if let Err(e) = self.store.clear() {
                tracing::error!(error = %e, "Failed to clear session");
            }
        }
        if let Some(notice) = decision.notice() {
            self.notify_once(navigation, notice);
        }

        if !decision.is_render() {
            tracing::info!(
                path = %navigation.path(),
                redirect = decision.target().unwrap_or_default(),
                "Navigation redirected"
            );
        }
        decision
    }

    /// Session check run on every navigation, gated or not.
    ///
    /// A session whose tokens are both unusable is cleared without a notice.
    pub fn session_check(&self) -> SessionStatus {
        let snapshot = self.store.snapshot();
        if snapshot.has_no_tokens() {
            return SessionStatus::Anonymous;
        }

        let now = Utc::now();
        let access = self.validator.status_of(snapshot.access.as_deref(), now);
        let refresh = self.validator.status_of(snapshot.refresh.as_deref(), now);

        match (access, refresh) {
            (TokenStatus::Valid { .. }, _) => SessionStatus::Active,
            (_, refresh) if refresh.is_usable() => SessionStatus::NeedsRefresh,
            (access, _) if access.is_usable() => SessionStatus::Active,
            _ => {
                tracing::info!("Stored session fully expired, clearing");
                if let Err(e) = self.store.clear() {
                    tracing::error!(error = %e, "Failed to clear session");
                }
                SessionStatus::Expired
            }
        }
    }

    fn notify_once(&self, navigation: &mut Navigation, notice: Notice) {
        if navigation.notified {
            return;
        }
        self.notifier.notify(&notice);
        navigation.notified = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_location_carries_destination() {
        let decision = GuardDecision::CreateProfile(RoleSelection {
            from: "/trainer/courses?tab=drafts".to_string(),
            required: ProfileType::Trainer,
        });

        assert_eq!(
            decision.location().unwrap(),
            "/role?from=%2Ftrainer%2Fcourses%3Ftab%3Ddrafts&required=trainer"
        );
        assert_eq!(decision.target(), Some("/role"));
        assert!(!decision.clears_session());
    }

    #[test]
    fn test_denials_map_to_error_taxonomy() {
        let login = GuardDecision::Login { notice: None };
        assert!(login.denial().unwrap().requires_login());

        let switch = GuardDecision::SwitchProfile {
            required: ProfileType::Store,
        };
        assert!(matches!(
            switch.denial(),
            Some(SessionError::AuthorizationDenied(_))
        ));
        assert!(GuardDecision::Render.denial().is_none());
    }

    #[test]
    fn test_notice_messages() {
        assert_eq!(
            Notice::SessionExpired.message(),
            "Your session has expired. Please login again."
        );
        assert_eq!(
            Notice::SwitchProfile(ProfileType::Gym).message(),
            "Switch to your gym profile to access this page."
        );
    }
}
