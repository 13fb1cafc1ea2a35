//! # HTTP Request Handlers
//!
//! Axum handlers organized by feature domain.
//!
//! ## Handler Modules
//!
//! - **[`auth`]**: Account endpoints
//!   - `POST /api/v1/register` - Create an account and mail a verification link
//!   - `POST /api/v1/login` - Authenticate with email/password, issue a session
//!   - `POST /api/v1/logout` - Clear the session cookie
//!   - `GET /api/v1/verify-email?token=` - Confirm an email address
//!   - `POST /api/v1/verify-email/resend` - Mail a fresh verification link
//!
//! - **[`user`]**: Endpoints behind the session middleware
//!   - `GET /api/v1/user` - Current user's public profile
//!
//! ## Error Handling
//!
//! Handlers return `Result<T, AppError>`; [`lib_core::AppError`] renders the status
//! and a `{"error", "code"}` JSON body.
//!
//! ## Request/Response Flow
//!
//! ```text
//! Client Request
//!     ↓
//! CORS → request stamp → trace span → logging → cookies
//!     ↓
//! Session middleware (protected routes only)
//!     ↓
//! Handler
//!     ↓
//! Response (Cache-Control: no-store on /api/v1)
//! ```

pub mod auth;
pub mod user;
