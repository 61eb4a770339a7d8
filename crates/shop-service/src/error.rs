//! API error types and responses.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::stripe::StripeError;

/// WooCommerce error code used for coupon failures.
pub const INVALID_COUPON_CODE: &str = "woocommerce_rest_invalid_coupon";

/// Message returned when an order already carries a coupon.
pub const COUPON_ALREADY_APPLIED: &str = "Vous utilisez déjà un code promo";

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid session.
    #[error("unauthorized")]
    Unauthorized,

    /// Login with an unknown email or a wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Coupon failed validation.
    #[error("invalid coupon: {0}")]
    InvalidCoupon(String),

    /// The order already has a coupon applied.
    #[error("coupon already applied")]
    CouponAlreadyApplied,

    /// Conflict - resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Request or file exceeds the configured size limit.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

/// WooCommerce-shaped error body used by the coupon endpoints.
#[derive(Debug, Serialize)]
struct WooErrorResponse {
    code: &'static str,
    message: String,
    data: WooErrorData,
}

#[derive(Debug, Serialize)]
struct WooErrorData {
    status: u16,
}

fn woo_error(status: StatusCode, message: String) -> Response {
    let body = WooErrorResponse {
        code: INVALID_COUPON_CODE,
        message,
        data: WooErrorData {
            status: status.as_u16(),
        },
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::InvalidCoupon(msg) => return woo_error(StatusCode::BAD_REQUEST, msg),
            Self::CouponAlreadyApplied => {
                return woo_error(StatusCode::CONFLICT, COUPON_ALREADY_APPLIED.to_string())
            }
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authentication required".to_string(),
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid credentials".to_string(),
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            Self::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg)
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            Self::ExternalService(msg) => {
                tracing::warn!(error = %msg, "External service error");
                (StatusCode::BAD_GATEWAY, "external_service_error", msg)
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<shop_store::StoreError> for ApiError {
    fn from(err: shop_store::StoreError) -> Self {
        match err {
            shop_store::StoreError::DuplicateId { collection, id } => {
                Self::Conflict(format!("{collection} already contains id {id}"))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<shop_core::CoreError> for ApiError {
    fn from(err: shop_core::CoreError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<StripeError> for ApiError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::Configuration(msg) => Self::Internal(msg),
            other => Self::ExternalService(other.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge("File too large".to_string())
        } else {
            Self::BadRequest(err.body_text())
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
