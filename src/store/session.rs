// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The session repository.
//!
//! All reads and writes of the persisted session go through [`SessionStore`].
//! Writes are last-write-wins; every successful mutation is broadcast so
//! views can subscribe instead of re-reading storage.

use super::keys;
use super::storage::{FileStorage, MemoryStorage, Storage, StorageError};
use crate::config::Config;
use crate::error::{Result, SessionError};
use crate::models::{Session, SessionEvent, SessionSnapshot, User};
use std::sync::Arc;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 16;

impl From<StorageError> for SessionError {
    fn from(e: StorageError) -> Self {
        SessionError::Storage(e.to_string())
    }
}

/// Typed access to the persisted `access`, `refresh` and `user` keys.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { storage, events }
    }

    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// File-backed store if a session file is configured, in-memory otherwise.
    pub fn from_config(config: &Config) -> Result<Self> {
        match &config.session_file {
            Some(path) => {
                let storage = FileStorage::open(path)?;
                tracing::info!(path = %path.display(), "Using file-backed session storage");
                Ok(Self::new(Arc::new(storage)))
            }
            None => Ok(Self::in_memory()),
        }
    }

    /// Receive every subsequent session change.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        tracing::debug!(?event, "Session changed");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    // ─── Reads ───────────────────────────────────────────────────────────────

    pub fn access_token(&self) -> Option<String> {
        self.storage.get_item(keys::ACCESS)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.storage.get_item(keys::REFRESH)
    }

    /// The stored user, or `None` if absent or failing validation.
    pub fn user(&self) -> Option<User> {
        let raw = self.storage.get_item(keys::USER)?;
        match User::parse(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring invalid stored user record");
                None
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            access: self.access_token(),
            refresh: self.refresh_token(),
            user: self.user(),
        }
    }

    // ─── Writes ──────────────────────────────────────────────────────────────

    /// Persist a freshly created session (login or signup).
    pub fn store_session(&self, session: &Session) -> Result<()> {
        let user = serde_json::to_string(&session.user)
            .map_err(|e| SessionError::Internal(e.into()))?;
        self.storage.set_items(&[
            (keys::ACCESS, &session.access),
            (keys::REFRESH, &session.refresh),
            (keys::USER, &user),
        ])?;
        self.emit(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Persist the result of a token refresh.
    pub fn store_refreshed(&self, access: &str, refresh: Option<&str>) -> Result<()> {
        match refresh {
            Some(refresh) => self
                .storage
                .set_items(&[(keys::ACCESS, access), (keys::REFRESH, refresh)])?,
            None => self.storage.set_item(keys::ACCESS, access)?,
        }
        self.emit(SessionEvent::TokensRefreshed);
        Ok(())
    }

    /// Persist profile-scoped tokens and the user's new active profile in one write.
    pub fn store_switched(&self, access: &str, refresh: &str, user: &User) -> Result<()> {
        let user = serde_json::to_string(user).map_err(|e| SessionError::Internal(e.into()))?;
        self.storage.set_items(&[
            (keys::ACCESS, access),
            (keys::REFRESH, refresh),
            (keys::USER, &user),
        ])?;
        self.emit(SessionEvent::ProfileSwitched);
        Ok(())
    }

    /// Put back tokens read earlier, undoing any refresh since.
    pub fn restore_tokens(&self, access: Option<&str>, refresh: Option<&str>) -> Result<()> {
        let mut set = Vec::new();
        let mut remove = Vec::new();
        for (key, value) in [(keys::ACCESS, access), (keys::REFRESH, refresh)] {
            match value {
                Some(value) => set.push((key, value)),
                None => remove.push(key),
            }
        }
        if !set.is_empty() {
            self.storage.set_items(&set)?;
        }
        if !remove.is_empty() {
            self.storage.remove_items(&remove)?;
        }
        self.emit(SessionEvent::TokensRefreshed);
        Ok(())
    }

    pub fn store_user(&self, user: &User) -> Result<()> {
        let user = serde_json::to_string(user).map_err(|e| SessionError::Internal(e.into()))?;
        self.storage.set_item(keys::USER, &user)?;
        self.emit(SessionEvent::UserUpdated);
        Ok(())
    }

    /// Destroy the session.
    pub fn clear(&self) -> Result<()> {
        self.remove_all()?;
        self.emit(SessionEvent::Cleared);
        Ok(())
    }

    /// Destroy an unrecoverable session and ask the UI to send the user to login.
    ///
    /// Once no tokens remain the session is already gone, so a repeated call
    /// removes leftovers without announcing anything.
    pub fn expire(&self) {
        let had_tokens = self.access_token().is_some() || self.refresh_token().is_some();
        if let Err(e) = self.remove_all() {
            tracing::error!(error = %e, "Failed to persist session removal");
        }
        if had_tokens {
            self.emit(SessionEvent::Cleared);
            self.emit(SessionEvent::LoginRequired);
        }
    }

    fn remove_all(&self) -> std::result::Result<(), StorageError> {
        self.storage.remove_items(&keys::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, ProfileId, ProfileType};

    fn test_user() -> User {
        User {
            id: 1,
            username: "alex".to_string(),
            email: "alex@gymgem.test".to_string(),
            current_profile: Some(ProfileId(1)),
            profiles: vec![Profile {
                profile_type: ProfileType::Trainee,
                id: ProfileId(1),
            }],
        }
    }

    #[test]
    fn test_store_and_snapshot() {
        let store = SessionStore::in_memory();
        assert!(store.snapshot().is_empty());

        store
            .store_session(&Session {
                access: "a".into(),
                refresh: "r".into(),
                user: test_user(),
            })
            .unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.access.as_deref(), Some("a"));
        assert_eq!(snapshot.refresh.as_deref(), Some("r"));
        assert_eq!(snapshot.user, Some(test_user()));
    }

    #[test]
    fn test_refresh_keeps_refresh_token_when_not_reissued() {
        let store = SessionStore::in_memory();
        store.store_refreshed("a1", Some("r1")).unwrap();
        store.store_refreshed("a2", None).unwrap();

        assert_eq!(store.access_token().as_deref(), Some("a2"));
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));
    }

    #[test]
    fn test_restore_tokens_puts_back_earlier_values() {
        let store = SessionStore::in_memory();
        store.store_refreshed("a1", Some("r1")).unwrap();
        store.store_refreshed("a2", Some("r2")).unwrap();

        store.restore_tokens(Some("a1"), Some("r1")).unwrap();
        assert_eq!(store.access_token().as_deref(), Some("a1"));
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));

        store.restore_tokens(None, Some("r1")).unwrap();
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));
    }

    #[test]
    fn test_invalid_user_record_reads_as_absent() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());

        storage
            .set_item(
                keys::USER,
                r#"{"id":1,"username":"a","email":"a@b.co","current_profile":5,"profiles":[]}"#,
            )
            .unwrap();
        assert_eq!(store.user(), None);

        storage.set_item(keys::USER, "[]").unwrap();
        assert_eq!(store.user(), None);
    }

    #[test]
    fn test_clear_removes_everything() {
        let store = SessionStore::in_memory();
        store
            .store_session(&Session {
                access: "a".into(),
                refresh: "r".into(),
                user: test_user(),
            })
            .unwrap();

        store.clear().unwrap();
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_changes_are_broadcast() {
        let store = SessionStore::in_memory();
        let mut events = store.subscribe();

        store.store_refreshed("a", None).unwrap();
        store.store_user(&test_user()).unwrap();
        store.expire();

        assert_eq!(events.recv().await.unwrap(), SessionEvent::TokensRefreshed);
        assert_eq!(events.recv().await.unwrap(), SessionEvent::UserUpdated);
        assert_eq!(events.recv().await.unwrap(), SessionEvent::Cleared);
        assert_eq!(events.recv().await.unwrap(), SessionEvent::LoginRequired);
    }

    #[tokio::test]
    async fn test_expire_announces_only_once() {
        let store = SessionStore::in_memory();
        store.store_refreshed("a", Some("r")).unwrap();
        let mut events = store.subscribe();

        store.expire();
        store.expire();

        assert_eq!(events.recv().await.unwrap(), SessionEvent::Cleared);
        assert_eq!(events.recv().await.unwrap(), SessionEvent::LoginRequired);
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
        assert!(store.snapshot().is_empty());
    }
}
