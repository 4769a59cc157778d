//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` covering the engine's failure taxonomy.
//! Server-side failures are captured to Sentry before responding; client
//! errors map straight to their status codes with human-readable messages.
//! All route handlers return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::mail::MailError;
use crate::services::auth::AuthError;
use crate::store::StoreError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Authentication operation failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Mail transport failed.
    #[error("mail error: {0}")]
    Mail(#[from] MailError),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the required permission or ownership.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Malformed input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The payment gateway declined or failed the charge.
    #[error("payment failed: {0}")]
    PaymentFailed(String),

    /// Uniqueness conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Internal(format!("token signing failed: {err}"))
    }
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Store(store_err) => match store_err {
            StoreError::NotFound => StatusCode::NOT_FOUND,
            StoreError::Conflict(_) => StatusCode::CONFLICT,
            StoreError::Database(_) | StoreError::DataCorruption(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
        AppError::Auth(auth_err) => match auth_err {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::UserAlreadyExists
            | AuthError::WeakPassword(_)
            | AuthError::InvalidEmail(_)
            | AuthError::PasswordMismatch
            | AuthError::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            AuthError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            AuthError::PasswordHash | AuthError::Store(_) | AuthError::Mail(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::PaymentFailed(_) => StatusCode::PAYMENT_REQUIRED,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Mail(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "request error"
            );
        }

        // Don't expose internal details to clients
        let message = if status.is_server_error() {
            "internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
