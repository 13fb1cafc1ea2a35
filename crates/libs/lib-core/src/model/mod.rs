//! # Model
//!
//! Persistence layer: connection pool, entities, and repositories.

pub mod store;
