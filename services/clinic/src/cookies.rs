//! Session cookie construction

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use time::OffsetDateTime;

use crate::session::SESSION_COOKIE_NAME;

/// Cookie carrying a session token until the session's expiry
pub fn session_cookie(token: &str, expires_at: DateTime<Utc>, secure: bool) -> Cookie<'static> {
    // Out-of-range timestamps degrade to a browser-session cookie
    let expires = OffsetDateTime::from_unix_timestamp(expires_at.timestamp()).ok();

    Cookie::build((SESSION_COOKIE_NAME, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .expires(expires)
        .build()
}

/// Cookie matching the session cookie's name and path, for removal
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, "")).path("/").build()
}
