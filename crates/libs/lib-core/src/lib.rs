//! # Core Library
//!
//! Configuration, errors, persistence, and wire types for the account service.

pub mod config;
pub mod dto;
pub mod error;
pub mod model;

// Re-export commonly used types
pub use config::{Config, SmtpConfig};
pub use error::{AppError, Result};
pub use model::store::{create_pool, DbPool};
