//! # Web Library
//!
//! HTTP layer of the account service: handlers, middleware, mail transport, and
//! server bootstrap.

pub mod handlers;
pub mod middleware;
pub mod server;
pub mod services;

pub use server::{create_router, start_server, AppState, ServerConfig};
