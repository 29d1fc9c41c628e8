//! Clinic service routes

use axum::{
    Extension, Form, Json, Router,
    extract::{State, rejection::JsonRejection},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use common::broadcast::ServerEvent;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::{
    AppState,
    cookies::{clear_session_cookie, session_cookie},
    error::{ApiError, ApiResult},
    middleware::{require_session, session_layer},
    models::CurrentUser,
    password::verify_password,
    session::SESSION_COOKIE_NAME,
    sse,
    validation::{QrScanRequest, ValidationErrors, normalize_email, validate_qr_scan},
};

/// Login form fields
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Create the router for the clinic service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/events", get(sse::subscribe).post(sse::subscribe))
        .route("/events/subscribe", post(sse::subscribe))
        .route("/me", get(current_user))
        .route_layer(middleware::from_fn(require_session));

    Router::new()
        .route("/health", get(health_check))
        .route("/login", get(login_status).post(login))
        .route("/logout", get(logout))
        .route("/qr", post(qr_scan))
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(state.clone(), session_layer))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "clinic"
    }))
}

/// Signed-in visitors have nothing to do on the login page
pub async fn login_status(current: Option<Extension<CurrentUser>>) -> Response {
    match current {
        Some(_) => Redirect::to("/").into_response(),
        None => Json(json!({ "authenticated": false })).into_response(),
    }
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> ApiResult<(CookieJar, Redirect)> {
    let email = normalize_email(&form.email);
    if email.is_empty() || form.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required.".to_string(),
        ));
    }

    info!("Login attempt for user: {}", email);

    let user = match state.users.find_by_email(&email).await? {
        Some(user) if user.is_active => user,
        _ => return Err(ApiError::InvalidCredentials),
    };

    let password_hash = user.password_hash.clone();
    let password = form.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password_hash, &password))
        .await
        .map_err(|e| {
            error!("Password verification task failed: {}", e);
            ApiError::InternalServerError
        })?;

    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    let (token, session) = state.sessions.create_session(user.id).await?;

    if let Err(e) = state.users.record_login(user.id, Utc::now()).await {
        warn!("Failed to record last login for {}: {}", user.id, e);
    }

    let jar = jar.add(session_cookie(
        &token,
        session.expires_at,
        state.config.secure_cookies,
    ));

    Ok((jar, Redirect::to("/")))
}

/// Logout endpoint
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(token) = jar.get(SESSION_COOKIE_NAME).map(|c| c.value().to_string()) {
        if let Err(e) = state.sessions.invalidate_session_token(&token).await {
            error!("Failed to invalidate session on logout: {}", e);
        }
    }

    (jar.remove(clear_session_cookie()), Redirect::to("/login"))
}

/// Profile of the signed-in user
pub async fn current_user(Extension(current): Extension<CurrentUser>) -> impl IntoResponse {
    Json(json!({ "user": current.user }))
}

/// QR check-in endpoint: fan a scanned student id out to every open event stream
pub async fn qr_scan(
    State(state): State<AppState>,
    current: Option<Extension<CurrentUser>>,
    payload: Result<Json<QrScanRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) =
        payload.map_err(|rejection| ValidationErrors::body(rejection.body_text()))?;
    let scan = validate_qr_scan(request)?;

    authorize_scan(&state, current.is_some(), scan.api_key.as_deref()).await?;

    let student_id = scan.scan.student_id.clone();
    match state.broadcaster.broadcast(&ServerEvent::QrCode(scan.scan)) {
        Ok(delivered) => debug!(
            "QR scan for student {} delivered to {} subscriber(s)",
            student_id, delivered
        ),
        Err(e) => error!("Failed to broadcast QR scan: {}", e),
    }

    Ok(Json(json!({ "ok": true })))
}

/// A scan is accepted from a signed-in session or with an active API key
async fn authorize_scan(
    state: &AppState,
    has_session: bool,
    api_key: Option<&str>,
) -> ApiResult<()> {
    if has_session {
        return Ok(());
    }

    let Some(api_key) = api_key else {
        return Err(ApiError::InvalidApiKey);
    };

    match state.api_keys.is_active_api_key(api_key).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(ApiError::InvalidApiKey),
        Err(e) => {
            error!("Failed to look up api key: {}", e);
            Err(ApiError::InvalidApiKey)
        }
    }
}
