//! Application state shared across handlers

use common::broadcast::{Broadcaster, MAIN_CHANNEL};
use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    config::AppConfig,
    repositories::{
        ApiKeyStore, SessionRepository, SettingRepository, UserRepository, UserStore,
    },
    session::SessionManager,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: SessionManager,
    pub users: Arc<dyn UserStore>,
    pub api_keys: Arc<dyn ApiKeyStore>,
    pub broadcaster: Arc<Broadcaster>,
}

impl AppState {
    /// Wire the Postgres repositories and a fresh broadcaster
    pub fn from_pool(config: AppConfig, pool: PgPool) -> Self {
        Self {
            config: Arc::new(config),
            sessions: SessionManager::new(Arc::new(SessionRepository::new(pool.clone()))),
            users: Arc::new(UserRepository::new(pool.clone())),
            api_keys: Arc::new(SettingRepository::new(pool)),
            broadcaster: Arc::new(Broadcaster::new(MAIN_CHANNEL)),
        }
    }
}
