//! # Authentication Handlers
//!
//! HTTP request handlers for the account lifecycle.
//!
//! ## Overview
//!
//! - Registration with email/password, followed by a mailed verification link
//! - Login issuing a session token (JSON body and `token` cookie)
//! - Logout clearing the cookie (sessions are stateless and die only by expiry)
//! - Email verification and resending of the link
//!
//! Password hashing and verification run on the blocking thread pool.
//!
//! ## Example
//!
//! ```rust,ignore
//! use axum::{Router, routing::post};
//! use lib_web::handlers::auth::{register, login};
//!
//! let app = Router::new()
//!     .route("/api/v1/register", post(register))
//!     .route("/api/v1/login", post(login))
//!     .with_state(state);
//! ```

use crate::middleware::SESSION_COOKIE;
use crate::services::{dispatch_verification_email, Mailer};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Query, State,
    },
    http::StatusCode,
};
use lib_auth::{pwd::Credential, PasswordHasher, SessionTokenService, VerificationTokenService};
use lib_core::dto::{
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, ResendVerificationRequest, VerifyEmailQuery,
};
use lib_core::model::store::{UserForCreate, UserRepository};
use lib_core::{AppError, Config, DbPool, Result};
use lib_utils::{validate_email, validate_length, validate_not_empty};
use std::sync::Arc;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};
use tracing::{debug, error, info, instrument, warn};

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;

const REGISTERED_MSG: &str = "Registration successful. Check your inbox to verify your email address.";
const RESEND_MSG: &str = "If the address belongs to an unverified account, a new verification link has been sent.";

/// Register handler - creates a new, unverified account.
///
/// # Returns
///
/// * `201` - Account created; a verification mail is sent in the background
/// * `400` - Unreadable body, blank names or password, malformed email, or password
///   outside 8..=128 characters
/// * `409` - Email already registered
///
/// A failure to issue the verification token or to send the mail is logged and
/// does not fail the request.
#[instrument(skip_all)]
pub async fn register(
    State(pool): State<DbPool>,
    State(hasher): State<PasswordHasher>,
    State(verifications): State<Arc<VerificationTokenService>>,
    State(mailer): State<Arc<dyn Mailer>>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    info!("[REGISTER] New registration request");

    let req = json_body(payload, "REGISTER")?;

    validate_registration(&req).map_err(|msg| {
        warn!("[REGISTER] Rejected payload: {}", msg);
        AppError::InvalidInput(msg)
    })?;

    let email = req.email.trim().to_string();

    if UserRepository::find_by_email(&pool, &email).await?.is_some() {
        warn!("[REGISTER] Email already registered");
        return Err(AppError::Conflict(format!("User with email {} already exists", email)));
    }

    debug!("[REGISTER] Hashing password...");
    let password = req.password;
    let credential = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(e.to_string()))?;

    debug!("[REGISTER] Creating user in database...");
    let user = UserRepository::create(
        &pool,
        UserForCreate::new(
            req.first_name.trim(),
            req.last_name.trim(),
            email.as_str(),
            credential.as_str(),
        ),
    )
    .await?;

    match verifications.issue(&user.email) {
        Ok(token) => {
            dispatch_verification_email(mailer, user.email.clone(), token);
        }
        Err(e) => error!("[REGISTER] Could not issue verification token: {}", e),
    }

    info!("[REGISTER] User {} created", user.id);

    Ok((StatusCode::CREATED, Json(MessageResponse::new(REGISTERED_MSG))))
}

fn validate_registration(req: &RegisterRequest) -> std::result::Result<(), String> {
    validate_not_empty(&req.first_name, "First name")?;
    validate_not_empty(&req.last_name, "Last name")?;
    validate_email(req.email.trim())?;
    validate_not_empty(&req.password, "Password")?;
    validate_length(&req.password, PASSWORD_MIN_LEN, PASSWORD_MAX_LEN, "Password")?;
    Ok(())
}

/// Unwrap a JSON body, turning axum's plain-text rejection into an `InvalidInput` error.
fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>, area: &str) -> Result<T> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        warn!("[{}] Unreadable request body: {}", area, rejection.body_text());
        AppError::InvalidInput("Request body must be a JSON object with the expected fields".to_string())
    })
}

/// Login handler - authenticates an existing user.
///
/// # Returns
///
/// * `200` - [`LoginResponse`] with the session token; the same token is set as the
///   `token` cookie (HttpOnly, SameSite=Strict, Path=/, Max-Age = session TTL)
/// * `400` - Unreadable body, blank email or password
/// * `401` - Unknown email or wrong password (same message for both)
/// * `403` - Correct password but the email address is not verified yet
///
/// An unknown email still runs a full password verification against a dummy
/// credential.
#[instrument(skip_all)]
pub async fn login(
    State(pool): State<DbPool>,
    State(config): State<Arc<Config>>,
    State(hasher): State<PasswordHasher>,
    State(sessions): State<Arc<SessionTokenService>>,
    cookies: Cookies,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    info!("[LOGIN] Login attempt");

    let req = json_body(payload, "LOGIN")?;

    validate_not_empty(&req.email, "Email").map_err(AppError::InvalidInput)?;
    validate_not_empty(&req.password, "Password").map_err(AppError::InvalidInput)?;

    let user = UserRepository::find_by_email(&pool, req.email.trim()).await?;

    let password = req.password;
    let (user, is_valid) = match user {
        Some(user) => {
            let credential = Credential::from_stored(user.password_hash.clone());
            let is_valid = tokio::task::spawn_blocking(move || hasher.verify(&credential, &password))
                .await
                .map_err(|e| AppError::Internal(format!("verification task failed: {}", e)))?;
            (Some(user), is_valid)
        }
        None => {
            let is_valid = tokio::task::spawn_blocking(move || hasher.verify_dummy(&password))
                .await
                .map_err(|e| AppError::Internal(format!("verification task failed: {}", e)))?;
            (None, is_valid)
        }
    };

    let user = match user {
        Some(user) if is_valid => user,
        Some(_) => {
            warn!("[LOGIN] Wrong password");
            return Err(AppError::InvalidCredentials);
        }
        None => {
            warn!("[LOGIN] Unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    if config.require_verified_email && !user.email_verified {
        warn!("[LOGIN] Email not verified for user {}", user.id);
        return Err(AppError::EmailNotVerified);
    }

    let token = sessions
        .issue(user.id)
        .map_err(|e| AppError::Internal(format!("session issue failed: {}", e)))?;

    let expires_in = sessions.ttl().num_seconds();
    cookies.add(session_cookie(token.clone(), expires_in, config.cookie_secure));

    info!("[LOGIN] User {} authenticated", user.id);

    Ok(Json(LoginResponse { token, expires_in }))
}

/// Logout handler - expires the session cookie.
///
/// Tokens are stateless; a copied token stays valid until it expires.
pub async fn logout(State(config): State<Arc<Config>>, cookies: Cookies) -> Json<MessageResponse> {
    cookies.add(session_cookie(String::new(), 0, config.cookie_secure));
    debug!("[LOGOUT] Session cookie cleared");

    Json(MessageResponse::new("Logged out"))
}

fn session_cookie(value: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Verify-email handler - consumes the link mailed at registration.
///
/// # Returns
///
/// * `200` - Address verified (repeating the request is harmless)
/// * `400` - Missing, malformed, tampered, expired, or wrong-purpose token, or an
///   address with no account; always `"Invalid or expired verification token"`
#[instrument(skip_all)]
pub async fn verify_email(
    State(pool): State<DbPool>,
    State(verifications): State<Arc<VerificationTokenService>>,
    query: std::result::Result<Query<VerifyEmailQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>> {
    let Ok(Query(query)) = query else {
        warn!("[VERIFY] Missing token parameter");
        return Err(AppError::InvalidVerificationToken("MissingToken".to_string()));
    };

    let claims = verifications.validate(&query.token).map_err(|e| {
        warn!(reason = ?e, "[VERIFY] Verification token rejected: {:?}", e);
        AppError::InvalidVerificationToken(format!("{:?}", e))
    })?;

    if !UserRepository::mark_email_verified(&pool, &claims.sub).await? {
        warn!("[VERIFY] Token for an address with no account");
        return Err(AppError::InvalidVerificationToken("UnknownEmail".to_string()));
    }

    info!("[VERIFY] Email address verified");

    Ok(Json(MessageResponse::new("Email address verified")))
}

/// Resend handler - mails a fresh verification link.
///
/// Answers `202` with the same message for every readable body, so the response
/// does not reveal whether the address has an account. An unreadable body is `400`.
#[instrument(skip_all)]
pub async fn resend_verification(
    State(pool): State<DbPool>,
    State(verifications): State<Arc<VerificationTokenService>>,
    State(mailer): State<Arc<dyn Mailer>>,
    payload: std::result::Result<Json<ResendVerificationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let req = json_body(payload, "VERIFY")?;
    let accepted = Ok((StatusCode::ACCEPTED, Json(MessageResponse::new(RESEND_MSG))));

    let email = req.email.trim();
    if email.is_empty() {
        return accepted;
    }

    let user = match UserRepository::find_by_email(&pool, email).await {
        Ok(Some(user)) if !user.email_verified => user,
        Ok(_) => {
            debug!("[VERIFY] Resend skipped: no unverified account");
            return accepted;
        }
        Err(e) => {
            error!("[VERIFY] Resend lookup failed: {}", e);
            return accepted;
        }
    };

    match verifications.issue(&user.email) {
        Ok(token) => {
            dispatch_verification_email(mailer, user.email, token);
            info!("[VERIFY] Verification link re-sent for user {}", user.id);
        }
        Err(e) => error!("[VERIFY] Could not issue verification token: {}", e),
    }

    accepted
}

#[cfg(test)]
mod tests;
