//! # Centralized Error Handling
//!
//! [`AppError`] is the error every handler returns. It maps to an HTTP status and a
//! JSON [`ErrorResponse`] body `{"error": <message>, "code": <variant>}`.
//!
//! ## Disclosure rules
//!
//! - **Authentication failures** ([`Unauthorized`](AppError::Unauthorized)) always render
//!   as `"Unauthorized"`. The detail string is for logs only, so expired, tampered and
//!   missing tokens are indistinguishable to the caller.
//! - **Credential failures** ([`InvalidCredentials`](AppError::InvalidCredentials)) render
//!   the same message for an unknown email and a wrong password.
//! - **Server errors** ([`Config`](AppError::Config), [`Internal`](AppError::Internal))
//!   render a generic message.
//!
//! ## Error Conversion
//!
//! - `From<anyhow::Error>` → `Internal`
//! - `From<sqlx::Error>` → `Conflict` on unique violations, `NotFound` on missing rows, else `Internal`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crate::dto::ErrorResponse;
use thiserror::Error;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Message shared by every failed login.
pub const INVALID_CREDENTIALS_MSG: &str = "Email or password is incorrect";

/// Message shared by every rejected verification link.
pub const INVALID_VERIFICATION_MSG: &str = "Invalid or expired verification token";

#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error during startup.
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request payload failed validation.
    ///
    /// **HTTP Status**: 400 Bad Request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unknown email or wrong password at login.
    ///
    /// **HTTP Status**: 401 Unauthorized
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing or rejected session token. The string is the internal cause.
    ///
    /// **HTTP Status**: 401 Unauthorized
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Correct password but the email address is not verified yet.
    ///
    /// **HTTP Status**: 403 Forbidden
    #[error("Email not verified")]
    EmailNotVerified,

    /// Rejected verification link. The string is the internal cause.
    ///
    /// **HTTP Status**: 400 Bad Request
    #[error("Invalid verification token: {0}")]
    InvalidVerificationToken(String),

    /// Unique constraint hit (e.g. email already registered).
    ///
    /// **HTTP Status**: 409 Conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// **HTTP Status**: 404 Not Found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unexpected failure (database, hashing, signing, task join).
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::InvalidVerificationToken(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::EmailNotVerified => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the caller.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) | AppError::Conflict(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::InvalidCredentials => INVALID_CREDENTIALS_MSG.to_string(),
            AppError::Unauthorized(_) => "Unauthorized".to_string(),
            AppError::EmailNotVerified => "Email address has not been verified".to_string(),
            AppError::InvalidVerificationToken(_) => INVALID_VERIFICATION_MSG.to_string(),
            AppError::Config(_) | AppError::Internal(_) => "An internal error occurred".to_string(),
        }
    }

    /// Variant name, used as the `code` field.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "Config",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::InvalidCredentials => "InvalidCredentials",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::EmailNotVerified => "EmailNotVerified",
            AppError::InvalidVerificationToken(_) => "InvalidVerificationToken",
            AppError::Conflict(_) => "Conflict",
            AppError::NotFound(_) => "NotFound",
            AppError::Internal(_) => "Internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Full detail goes to the logs only
        if status.is_server_error() {
            tracing::error!("Server error: {}", self);
        } else {
            tracing::debug!("Client error: {}", self);
        }

        let body = Json(ErrorResponse {
            error: self.user_message(),
            code: self.code().to_string(),
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Database record not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Record already exists".to_string())
            }
            sqlx::Error::Database(db_err) => AppError::Internal(format!("Database error: {}", db_err.message())),
            _ => AppError::Internal(format!("Database error: {}", err)),
        }
    }
}
