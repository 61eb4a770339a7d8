//! Admin login, logout and session handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use shop_core::AdminSession;

use crate::auth::{clear_session_cookie, session_cookie, session_token};
use crate::error::ApiError;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    #[serde(default)]
    pub email: String,
    /// Account password.
    #[serde(default)]
    pub password: String,
}

/// Login response body.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Always true.
    pub success: bool,
    /// The logged-in admin.
    pub admin: AdminSession,
}

/// Logout response body.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Always true.
    pub success: bool,
}

/// Log in and set the session cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest("Email and password are required".into()));
    }

    let admin = state
        .admins
        .login(&body.email, &body.password)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let token = state.admins.issue_token(&admin.id)?;
    let cookie = session_cookie(&token)?;

    let body = LoginResponse {
        success: true,
        admin: admin.session(),
    };
    Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
}

/// Clear the session cookie.
pub async fn logout() -> impl IntoResponse {
    ([clear_session_cookie()], Json(LogoutResponse { success: true }))
}

/// The admin behind the current session.
///
/// A token that no longer verifies also clears the cookie.
pub async fn me(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(token) = session_token(&headers) else {
        return ApiError::Unauthorized.into_response();
    };

    let admin = match state.admins.verify_token(&token) {
        Some(id) => state.admins.get(&id).await,
        None => Ok(None),
    };

    match admin {
        Ok(Some(admin)) => Json(admin.session()).into_response(),
        Ok(None) => ([clear_session_cookie()], ApiError::Unauthorized).into_response(),
        Err(e) => e.into_response(),
    }
}
