//! Unified error handling
//!
//! All handlers return [`AppResult<T>`]; every error funnels through
//! [`AppError::into_response`] and is rendered as the standard
//! `{code, message}` envelope. Nothing leaks an unhandled error past the
//! request boundary.
//!
//! # Error code ranges
//!
//! | Prefix | Category | Example |
//! |--------|----------|---------|
//! | E0xxx  | General  | E0003 not found |
//! | E2xxx  | Permission | E2001 forbidden |
//! | E3xxx  | Auth tokens | E3002 invalid token |
//! | E9xxx  | System   | E9002 database |
//!
//! Coupon rejections keep their domain-specific string codes
//! (`INVALID_COUPON`, `COUPON_USAGE_EXCEEDED`, ...) because clients branch
//! on them.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::CouponRejection;
use shared::response::ApiResponse;
use tracing::error;

use crate::db::repository::RepoError;

/// Application error enum
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Authentication errors (401) ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    // ========== Authorization errors (403) ==========
    #[error("Permission denied: {0}")]
    Forbidden(String),

    // ========== Domain errors (4xx) ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// State-conflict errors: illegal status transition, duplicate return
    /// request, delete on a paid order. Message enumerates the valid states.
    #[error("{0}")]
    StateConflict(String),

    /// Coupon validation outcome, surfaced with its domain code
    #[error("{0}")]
    Coupon(#[from] CouponRejection),

    // ========== System errors (5xx) ==========
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Invalid request: {0}")]
    Invalid(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn state_conflict(message: impl Into<String>) -> Self {
        Self::StateConflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message): (StatusCode, String, String) = match &self {
            // Authentication errors (401)
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "E3001".into(),
                "Please login first".into(),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "E3003".into(),
                "Token expired".into(),
            ),
            AppError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, "E3002".into(), msg.clone()),

            // Authorization errors (403)
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "E2001".into(), msg.clone()),

            // Not found (404)
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003".into(), msg.clone()),

            // Conflict (409)
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "E0004".into(), msg.clone()),

            // Validation (400)
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "E0002".into(), msg.clone()),

            // State conflicts (400): message lists the valid prior states
            AppError::StateConflict(msg) => (StatusCode::BAD_REQUEST, "E0005".into(), msg.clone()),

            // Coupon rejections keep their domain code; unknown code is 404
            AppError::Coupon(rej) => {
                let status = if rej.is_not_found() {
                    StatusCode::NOT_FOUND
                } else {
                    StatusCode::BAD_REQUEST
                };
                (status, rej.code().into(), rej.to_string())
            }

            // Database errors (500): full detail to logs, generic to client
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9002".into(),
                    "Database error".into(),
                )
            }

            // Internal errors (500): the message is already client-safe,
            // upstream detail is logged at the call site
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "E9001".into(), msg.clone())
            }

            // Invalid request (400)
            AppError::Invalid(msg) => (StatusCode::BAD_REQUEST, "E0006".into(), msg.clone()),
        };

        let body = Json(ApiResponse::<()>::error(code, message));
        (status, body).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

/// Result type for API handlers
pub type AppResult<T> = Result<T, AppError>;

// ========== Helper functions ==========

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok(data))
}

/// Create a successful response with custom message
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok_with_message(data, message))
}
