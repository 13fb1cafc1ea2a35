//! # Authentication Data Transfer Objects
//!
//! Request and response bodies for the `/api/v1` account endpoints.
//!
//! ## Endpoints Using These DTOs
//!
//! - `POST /api/v1/register` - [`RegisterRequest`] -> [`MessageResponse`] (201)
//! - `POST /api/v1/login` - [`LoginRequest`] -> [`LoginResponse`] (+ `token` cookie)
//! - `POST /api/v1/logout` - [`MessageResponse`]
//! - `GET /api/v1/user` - [`UserInfo`]
//! - `GET /api/v1/verify-email?token=...` - [`VerifyEmailQuery`] -> [`MessageResponse`]
//! - `POST /api/v1/verify-email/resend` - [`ResendVerificationRequest`] -> [`MessageResponse`] (202)
//!
//! Errors from any of them use [`ErrorResponse`].
//!
//! ## Wire Format
//!
//! Field names are **snake_case** (default serde behavior). Timestamps serialize as
//! RFC 3339 strings.
//!
//! ```text
//! POST /api/v1/login
//! Content-Type: application/json
//!
//! { "email": "ada@example.com", "password": "correct horse battery" }
//! ```
//!
//! Response:
//! ```text
//! { "token": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...", "expires_in": 604800 }
//! ```

use crate::model::store::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registration payload.
///
/// # Validation Rules (Server-Side)
///
/// - `first_name` and `last_name` must not be blank
/// - `email` must be a plausible address and not already registered
/// - `password` must be 8 to 128 characters
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login payload.
///
/// # Security Note
///
/// Password is sent in plaintext over HTTPS and never logged; `Debug` redacts it.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login.
///
/// The same token is also set as the `token` cookie. Send it back either way:
/// ```text
/// Authorization: Bearer <token>
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// User information (public, safe to send to client).
///
/// # Security
///
/// Excludes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            email_verified: user.email_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Query string of the link mailed to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyEmailQuery {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResendVerificationRequest {
    pub email: String,
}

/// Standard error response for all API endpoints.
///
/// # HTTP Status Codes
///
/// - `400 Bad Request` - Validation error or rejected verification link
/// - `401 Unauthorized` - Bad credentials or missing/invalid session
/// - `403 Forbidden` - Email not verified yet
/// - `404 Not Found` - Resource doesn't exist
/// - `409 Conflict` - Email already registered
/// - `500 Internal Server Error` - Server-side error
///
/// # JSON Example
///
/// ```json
/// { "error": "Email or password is incorrect", "code": "InvalidCredentials" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_debug_redacts_password() {
        let req = LoginRequest {
            email: "ada@example.com".to_string(),
            password: "correct horse battery".to_string(),
        };

        let printed = format!("{req:?}");
        assert!(printed.contains("ada@example.com"));
        assert!(!printed.contains("correct horse"));
    }

    #[test]
    fn test_register_request_wire_names() {
        let json = r#"{"first_name":"Ada","last_name":"Lovelace","email":"ada@example.com","password":"pw12345678"}"#;

        let req: RegisterRequest = serde_json::from_str(json).expect("Deserialization should succeed in test");

        assert_eq!(req.first_name, "Ada");
        assert_eq!(req.last_name, "Lovelace");
        assert!(!format!("{req:?}").contains("pw12345678"));
    }

    #[test]
    fn test_user_info_omits_hash() {
        let now = Utc::now();
        let user = User {
            id: 3,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            email_verified: true,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(UserInfo::from(user)).expect("Serialization should succeed in test");

        assert_eq!(json["id"], 3);
        assert_eq!(json["email_verified"], true);
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2id"));
    }
}
