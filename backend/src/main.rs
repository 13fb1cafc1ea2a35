//! # Account Service
//!
//! Thin entry point that delegates to lib-web for server setup.

use lib_web::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    let config = ServerConfig {
        bind_address: format!("0.0.0.0:{}", port),
        migrations_path: "migrations",
    };

    start_server(config).await
}
