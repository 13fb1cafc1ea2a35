//! # User Repository
//!
//! Database access for user records. Emails are matched case-insensitively
//! (`COLLATE NOCASE` on the column).
//!
//! ## Example
//!
//! ```rust,no_run
//! # use lib_core::model::store::{create_pool, UserForCreate, UserRepository};
//! # async fn example() -> anyhow::Result<()> {
//! let pool = create_pool("sqlite::memory:").await?;
//!
//! let user = UserRepository::create(
//!     &pool,
//!     UserForCreate::new("Ada", "Lovelace", "ada@example.com", "$argon2id$..."),
//! )
//! .await?;
//!
//! let found = UserRepository::find_by_id(&pool, user.id).await?;
//! assert!(found.is_some());
//! # Ok(())
//! # }
//! ```

use super::models::{User, UserForCreate};
use super::DbPool;
use crate::error::{AppError, Result};
use sqlx::query_as;

pub struct UserRepository;

impl UserRepository {
    /// Find a user by email address.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - No user with that email
    /// * `Err(AppError::Internal)` - Database error
    pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
        let user = query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Find a user by id.
    pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<User>> {
        let user = query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Insert a new, unverified user.
    ///
    /// # Errors
    ///
    /// * `AppError::Conflict` - Email already registered
    /// * `AppError::Internal` - Any other database failure
    pub async fn create(pool: &DbPool, user_data: UserForCreate) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users (first_name, last_name, email, password_hash) VALUES (?, ?, ?, ?)",
        )
        .bind(&user_data.first_name)
        .bind(&user_data.last_name)
        .bind(&user_data.email)
        .bind(&user_data.password_hash)
        .execute(pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("User with email {} already exists", user_data.email))
            }
            other => other,
        })?;

        let id = result.last_insert_rowid();

        let user = query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(user)
    }

    /// Mark an email address as verified.
    ///
    /// Returns `false` if no user has that email. Re-verifying is a no-op that still
    /// returns `true`.
    pub async fn mark_email_verified(pool: &DbPool, email: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET email_verified = 1, updated_at = CURRENT_TIMESTAMP WHERE email = ?",
        )
        .bind(email)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
