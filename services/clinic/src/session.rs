//! Session management backed by a [`SessionStore`]
//!
//! Clients hold an opaque random token in the `auth-session` cookie. The
//! store only ever sees the SHA-256 of that token, which doubles as the
//! session id, so reading the sessions table is not enough to forge a
//! session.
//!
//! Sessions live for 30 days. A session validated within the last 15 days
//! of its lifetime is pushed out to a fresh 30 days; an expired session is
//! deleted the first time it is presented.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use common::error::DatabaseResult;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    models::{Session, ValidatedSession},
    repositories::SessionStore,
};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE_NAME: &str = "auth-session";

/// Total lifetime of a fresh or renewed session
pub const SESSION_LIFETIME_DAYS: i64 = 30;

/// Sessions are renewed once their remaining lifetime drops to this
pub const SESSION_RENEWAL_DAYS: i64 = 15;

const TOKEN_BYTES: usize = 18;

/// Generate a new random session token (144 bits, base64url)
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Derive the stored session id from a token
pub fn hash_session_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Session manager for issuing, validating and revoking sessions
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    lifetime: Duration,
    renew_within: Duration,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            lifetime: Duration::days(SESSION_LIFETIME_DAYS),
            renew_within: Duration::days(SESSION_RENEWAL_DAYS),
        }
    }

    /// Create a new session for a user, returning the raw token and the row
    pub async fn create_session(&self, user_id: Uuid) -> DatabaseResult<(String, Session)> {
        self.create_session_at(user_id, Utc::now()).await
    }

    pub async fn create_session_at(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DatabaseResult<(String, Session)> {
        let token = generate_session_token();
        let session = Session {
            id: hash_session_token(&token),
            user_id,
            expires_at: now + self.lifetime,
            created_at: now,
        };

        self.store.insert(&session).await?;
        info!("Created session for user: {}", user_id);

        Ok((token, session))
    }

    /// Validate a token, renewing or expiring its session as needed
    pub async fn validate_session_token(
        &self,
        token: &str,
    ) -> DatabaseResult<Option<ValidatedSession>> {
        self.validate_session_token_at(token, Utc::now()).await
    }

    pub async fn validate_session_token_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<ValidatedSession>> {
        let session_id = hash_session_token(token);

        let Some((mut session, user)) = self.store.find_with_user(&session_id).await? else {
            return Ok(None);
        };

        if now >= session.expires_at {
            debug!("Session for user {} expired, deleting", user.id);
            self.store.delete(&session.id).await?;
            return Ok(None);
        }

        let renewed = now >= session.expires_at - self.renew_within;
        if renewed {
            session.expires_at = now + self.lifetime;
            self.store
                .update_expiry(&session.id, session.expires_at)
                .await?;
            debug!(
                "Renewed session for user {} until {}",
                user.id, session.expires_at
            );
        }

        Ok(Some(ValidatedSession {
            session,
            user,
            renewed,
        }))
    }

    /// Delete a session by id; missing sessions are ignored
    pub async fn invalidate_session(&self, session_id: &str) -> DatabaseResult<()> {
        self.store.delete(session_id).await?;
        info!("Invalidated session");
        Ok(())
    }

    /// Delete the session belonging to a raw cookie token
    pub async fn invalidate_session_token(&self, token: &str) -> DatabaseResult<()> {
        self.invalidate_session(&hash_session_token(token)).await
    }
}
