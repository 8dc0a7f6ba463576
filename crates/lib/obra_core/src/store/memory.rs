//! In-memory [`AuthStore`], used by tests and local runs without a database.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::AuthStore;
use crate::auth::AuthError;
use crate::models::auth::{AuditEvent, SessionRecord, UserRecord};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<String, UserRecord>,
    sessions: DashMap<String, SessionRecord>,
    audit: Mutex<Vec<AuditEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user row.
    pub fn insert_user(&self, user: UserRecord) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn user(&self, user_id: &str) -> Option<UserRecord> {
        self.users.get(user_id).map(|u| u.clone())
    }

    /// Overwrite a session's `last_activity`, e.g. to simulate idling.
    pub fn set_session_last_activity(&self, session_id: &str, at: DateTime<Utc>) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(mut s) => {
                s.last_activity = at;
                true
            }
            None => false,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Snapshot of recorded audit events, oldest first.
    pub fn audit_events(&self) -> Vec<AuditEvent> {
        self.audit
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        let email = email.to_lowercase();
        Ok(self
            .users
            .iter()
            .find(|u| u.email.to_lowercase() == email)
            .map(|u| u.clone()))
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.user(user_id))
    }

    async fn record_login(&self, user_id: &str) -> Result<(), AuthError> {
        if let Some(mut u) = self.users.get_mut(user_id) {
            u.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn deactivate_user(&self, email: &str) -> Result<(), AuthError> {
        let email = email.to_lowercase();
        for mut u in self.users.iter_mut() {
            if u.email.to_lowercase() == email {
                u.active = false;
            }
        }
        Ok(())
    }

    async fn reset_password(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        match self.users.get_mut(user_id) {
            Some(mut u) => {
                u.password_hash = password_hash.to_string();
                u.active = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_session(&self, session_id: &str, user_id: &str) -> Result<(), AuthError> {
        let now = Utc::now();
        self.sessions.insert(
            session_id.to_string(),
            SessionRecord {
                session_id: session_id.to_string(),
                user_id: user_id.to_string(),
                last_activity: now,
                created_at: now,
            },
        );
        Ok(())
    }

    async fn find_session(&self, session_id: &str) -> Result<Option<SessionRecord>, AuthError> {
        Ok(self.sessions.get(session_id).map(|s| s.clone()))
    }

    async fn touch_session(&self, session_id: &str) -> Result<(), AuthError> {
        if let Some(mut s) = self.sessions.get_mut(session_id) {
            s.last_activity = Utc::now();
        }
        Ok(())
    }

    async fn rotate_session(
        &self,
        old_session_id: &str,
        new_session_id: &str,
    ) -> Result<(), AuthError> {
        if let Some((_, mut session)) = self.sessions.remove(old_session_id) {
            session.session_id = new_session_id.to_string();
            session.last_activity = Utc::now();
            self.sessions.insert(new_session_id.to_string(), session);
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), AuthError> {
        self.sessions.remove(session_id);
        Ok(())
    }

    async fn append_audit(&self, event: AuditEvent) -> Result<(), AuthError> {
        self.audit
            .lock()
            .map_err(|_| AuthError::Internal("audit log poisoned".into()))?
            .push(event);
        Ok(())
    }
}
