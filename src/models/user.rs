// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User and profile models, validated at the storage boundary.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use validator::{Validate, ValidationError};

#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// The role a profile grants within the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ProfileType {
    Trainer,
    Trainee,
    Gym,
    Store,
}

impl ProfileType {
    pub const ALL: [ProfileType; 4] = [
        ProfileType::Trainer,
        ProfileType::Trainee,
        ProfileType::Gym,
        ProfileType::Store,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileType::Trainer => "trainer",
            ProfileType::Trainee => "trainee",
            ProfileType::Gym => "gym",
            ProfileType::Store => "store",
        }
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-assigned profile identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileId(pub u64);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A typed capability attached to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    #[serde(rename = "type")]
    pub profile_type: ProfileType,
    pub id: ProfileId,
}

/// User record persisted alongside the tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_profiles"))]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    /// Active profile, if any
    #[serde(default)]
    pub current_profile: Option<ProfileId>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

/// At most one profile per type, and the current profile must be held.
fn validate_profiles(user: &User) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    if !user.profiles.iter().all(|p| seen.insert(p.profile_type)) {
        return Err(ValidationError::new("duplicate_profile_type"));
    }
    if let Some(current) = user.current_profile {
        if !user.holds(current) {
            return Err(ValidationError::new("current_profile_not_held"));
        }
    }
    Ok(())
}

/// Why a stored user record was rejected.
#[derive(Debug, thiserror::Error)]
pub enum UserRecordError {
    #[error("malformed user record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid user record: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

impl User {
    /// Parse a serialized record, rejecting anything that breaks the invariants.
    pub fn parse(raw: &str) -> Result<Self, UserRecordError> {
        let user: User = serde_json::from_str(raw)?;
        user.validate()?;
        Ok(user)
    }

    /// True if `id` is one of this user's profiles.
    pub fn holds(&self, id: ProfileId) -> bool {
        self.profiles.iter().any(|p| p.id == id)
    }

    pub fn profile_of_type(&self, profile_type: ProfileType) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.profile_type == profile_type)
    }

    /// The currently active profile.
    pub fn current(&self) -> Option<&Profile> {
        let current = self.current_profile?;
        self.profiles.iter().find(|p| p.id == current)
    }

    /// True if the active profile is of the given type.
    pub fn is_active_as(&self, profile_type: ProfileType) -> bool {
        self.current()
            .is_some_and(|p| p.profile_type == profile_type)
    }

    /// Copy of this record with a different active profile.
    pub fn with_current_profile(&self, id: ProfileId) -> Self {
        Self {
            current_profile: Some(id),
            ..self.clone()
        }
    }
}
