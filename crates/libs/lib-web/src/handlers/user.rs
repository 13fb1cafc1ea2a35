//! # User Handlers
//!
//! Endpoints that require a valid session.

use crate::middleware::CtxUser;
use axum::{extract::State, Json};
use lib_core::model::store::UserRepository;
use lib_core::{dto::UserInfo, AppError, DbPool, Result};
use tracing::{debug, instrument, warn};

/// Current user's public profile.
///
/// # Returns
///
/// * `200` - [`UserInfo`] for the user bound by the session
/// * `404` - Session is valid but the user no longer exists
#[instrument(skip(pool), fields(user_id = user.user_id))]
pub async fn get_user(State(pool): State<DbPool>, user: CtxUser) -> Result<Json<UserInfo>> {
    debug!("[USER] Loading profile");

    match UserRepository::find_by_id(&pool, user.user_id).await? {
        Some(found) => Ok(Json(UserInfo::from(found))),
        None => {
            warn!("[USER] Session bound to missing user {}", user.user_id);
            Err(AppError::NotFound("User not found".to_string()))
        }
    }
}
