//! Storage seams for sessions, users and API keys
//!
//! Handlers and the session manager only see these traits. The Postgres
//! repositories implement them in production; tests use the in-memory
//! versions from [`memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{NewUser, Session, User};

#[cfg(test)]
pub mod memory;
pub mod session;
pub mod setting;
pub mod user;

pub use session::SessionRepository;
pub use setting::SettingRepository;
pub use user::UserRepository;

/// Persistence of session rows keyed by token hash
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: &Session) -> DatabaseResult<()>;

    /// Look up a session together with its owning user
    async fn find_with_user(&self, session_id: &str) -> DatabaseResult<Option<(Session, User)>>;

    async fn update_expiry(&self, session_id: &str, expires_at: DateTime<Utc>)
    -> DatabaseResult<()>;

    /// Delete a session; deleting a missing id is not an error
    async fn delete(&self, session_id: &str) -> DatabaseResult<()>;
}

/// Staff accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> DatabaseResult<()>;
}

/// Kiosk API keys kept in system settings
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn is_active_api_key(&self, key: &str) -> DatabaseResult<bool>;
}
