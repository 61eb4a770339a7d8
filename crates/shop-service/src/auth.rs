//! Admin session authentication.
//!
//! A session token is `<admin_id>.<hex HMAC-SHA256(secret, admin_id)>`. It is
//! carried in the `admin_session` cookie or the `x-admin-session` header.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};

use shop_core::Admin;

use crate::error::ApiError;
use crate::state::AppState;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "admin_session";

/// Header accepted in place of the cookie.
pub const SESSION_HEADER: &str = "x-admin-session";

/// Session lifetime in seconds (24 hours).
pub const SESSION_MAX_AGE_SECS: u64 = 24 * 60 * 60;

/// An authenticated admin.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// The admin account.
    pub admin: Admin,
}

/// Value of a named cookie in the `Cookie` header(s).
#[must_use]
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Session token from the cookie, else the header.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, SESSION_COOKIE)
        .or_else(|| {
            headers
                .get(SESSION_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .filter(|token| !token.is_empty())
}

/// `Set-Cookie` value establishing a session.
///
/// # Errors
///
/// Returns `ApiError::Internal` if the token is not a valid header value.
pub fn session_cookie(token: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Max-Age={SESSION_MAX_AGE_SECS}; Path=/; SameSite=Lax"
    ))
    .map_err(|e| ApiError::Internal(e.to_string()))
}

/// `Set-Cookie` value clearing the session.
#[must_use]
pub fn clear_session_cookie() -> (axum::http::HeaderName, HeaderValue) {
    (
        SET_COOKIE,
        HeaderValue::from_static("admin_session=; HttpOnly; Max-Age=0; Path=/; SameSite=Lax"),
    )
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(ApiError::Unauthorized)?;

        let admin_id = state
            .admins
            .verify_token(&token)
            .ok_or(ApiError::Unauthorized)?;

        // The account must still exist
        let admin = state
            .admins
            .get(&admin_id)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(Self { admin })
    }
}
