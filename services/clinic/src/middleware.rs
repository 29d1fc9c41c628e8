//! Session cookie middleware
//!
//! [`session_layer`] runs on every request: it validates the `auth-session`
//! cookie and attaches a [`CurrentUser`] to the request extensions.
//! [`require_session`] guards browser routes and sends anonymous visitors to
//! the login page.

use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::{debug, error};

use crate::{
    AppState,
    cookies::{clear_session_cookie, session_cookie},
    models::CurrentUser,
    session::SESSION_COOKIE_NAME,
};

/// Validate the session cookie and attach the current user
pub async fn session_layer(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let mut jar = jar;

    if let Some(token) = jar.get(SESSION_COOKIE_NAME).map(|c| c.value().to_string()) {
        match state.sessions.validate_session_token(&token).await {
            Ok(Some(validated)) if validated.user.is_active => {
                if validated.renewed {
                    jar = jar.add(session_cookie(
                        &token,
                        validated.session.expires_at,
                        state.config.secure_cookies,
                    ));
                }

                req.extensions_mut().insert(CurrentUser {
                    user: validated.user,
                });
            }
            Ok(Some(validated)) => {
                debug!("Rejecting session of inactive user {}", validated.user.id);
                if let Err(e) = state.sessions.invalidate_session(&validated.session.id).await {
                    error!("Failed to invalidate session: {}", e);
                }
                jar = jar.remove(clear_session_cookie());
            }
            Ok(None) => {
                debug!("Session cookie did not match a live session");
                jar = jar.remove(clear_session_cookie());
            }
            Err(e) => {
                // Store trouble: continue unauthenticated and keep the cookie
                error!("Failed to validate session: {}", e);
            }
        }
    }

    let response = next.run(req).await;

    if sets_session_cookie(&response) {
        response
    } else {
        (jar, response).into_response()
    }
}

/// Redirect to `/login` unless the session layer attached a user
pub async fn require_session(req: Request, next: Next) -> Response {
    if req.extensions().get::<CurrentUser>().is_none() {
        return Redirect::to("/login").into_response();
    }

    next.run(req).await
}

/// Whether a handler already issued or removed the session cookie itself
fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{}=", SESSION_COOKIE_NAME);
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}
