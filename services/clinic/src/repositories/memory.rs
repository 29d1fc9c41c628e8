//! In-memory stores for tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};
use uuid::Uuid;

use super::{ApiKeyStore, SessionStore, UserStore};
use crate::models::{NewUser, Session, User, UserRole};

/// One store backing every trait, so sessions can join their users
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
    sessions: Mutex<HashMap<String, Session>>,
    api_keys: Mutex<Vec<(String, bool)>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail like an unreachable database
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn add_user(&self, email: &str, password_hash: &str, is_active: bool) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            first_name: "Test".to_string(),
            last_name: "Nurse".to_string(),
            role: UserRole::Nurse,
            is_active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().insert(user.id, user.clone());
        user
    }

    pub fn add_api_key(&self, key: &str, is_active: bool) {
        self.api_keys
            .lock()
            .unwrap()
            .push((key.to_string(), is_active));
    }

    pub fn session(&self, session_id: &str) -> Option<Session> {
        self.sessions.lock().unwrap().get(session_id).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    fn check(&self) -> DatabaseResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DatabaseError::Connection(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, session: &Session) -> DatabaseResult<()> {
        self.check()?;
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn find_with_user(&self, session_id: &str) -> DatabaseResult<Option<(Session, User)>> {
        self.check()?;
        let session = self.sessions.lock().unwrap().get(session_id).cloned();
        Ok(session.and_then(|session| {
            self.users
                .lock()
                .unwrap()
                .get(&session.user_id)
                .cloned()
                .map(|user| (session, user))
        }))
    }

    async fn update_expiry(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
    ) -> DatabaseResult<()> {
        self.check()?;
        if let Some(session) = self.sessions.lock().unwrap().get_mut(session_id) {
            session.expires_at = expires_at;
        }
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> DatabaseResult<()> {
        self.check()?;
        self.sessions.lock().unwrap().remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        self.check()?;
        let mut user = self.add_user(&new_user.email, &new_user.password_hash, true);
        user.role = new_user.role;
        user.first_name = new_user.first_name.clone();
        user.last_name = new_user.last_name.clone();
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        self.check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> DatabaseResult<()> {
        self.check()?;
        if let Some(user) = self.users.lock().unwrap().get_mut(&user_id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl ApiKeyStore for MemoryStore {
    async fn is_active_api_key(&self, key: &str) -> DatabaseResult<bool> {
        self.check()?;
        Ok(self
            .api_keys
            .lock()
            .unwrap()
            .iter()
            .any(|(candidate, active)| *active && candidate == key))
    }
}
