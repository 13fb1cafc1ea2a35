//! # Authentication Middleware
//!
//! Locates the session token, validates it, and binds the user id to the request.
//!
//! The token is taken from `Authorization: Bearer <token>` when present, otherwise
//! from the `token` cookie set at login. Every failure answers `401` with the same
//! body; the precise cause is logged at `warn`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use axum::{middleware::from_fn_with_state, routing::get, Router};
//! use lib_web::middleware::{require_auth, CtxUser};
//!
//! let app = Router::new()
//!     .route("/api/v1/user", get(handler))
//!     .route_layer(from_fn_with_state(state.clone(), require_auth))
//!     .with_state(state);
//!
//! async fn handler(user: CtxUser) -> String {
//!     format!("Hello, user {}!", user.user_id)
//! }
//! ```

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use lib_auth::SessionTokenService;
use lib_core::AppError;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::{debug, warn};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

/// The authenticated user bound to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtxUser {
    pub user_id: i64,
}

impl<S: Send + Sync> FromRequestParts<S> for CtxUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CtxUser>().copied().ok_or_else(|| {
            warn!("[AUTH] No authenticated user in request context");
            AppError::Unauthorized("MissingContext".to_string())
        })
    }
}

/// Session authentication middleware.
///
/// # Behavior
///
/// - **Valid token**: continues with [`CtxUser`] in the request extensions
/// - **Missing, malformed, tampered, expired, or wrong-purpose token**: `401 Unauthorized`
pub async fn require_auth(
    State(sessions): State<Arc<SessionTokenService>>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let cookie_token = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string());

    let token = locate_token(req.headers(), cookie_token).ok_or_else(|| {
        warn!("[AUTH] MissingCredential: no bearer token or session cookie");
        AppError::Unauthorized("MissingCredential".to_string())
    })?;

    let claims = sessions.validate(&token).map_err(|e| {
        warn!(reason = ?e, "[AUTH] Session token rejected: {:?}", e);
        AppError::Unauthorized(format!("{:?}", e))
    })?;

    debug!("[AUTH] Authenticated user id {}", claims.sub);

    req.extensions_mut().insert(CtxUser { user_id: claims.sub });

    Ok(next.run(req).await)
}

/// Bearer header first, then the session cookie. Blank values count as absent.
fn locate_token(headers: &HeaderMap, cookie_token: Option<String>) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
        .map(|(_, token)| token.trim().to_string())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| cookie_token.filter(|token| !token.trim().is_empty()))
}
