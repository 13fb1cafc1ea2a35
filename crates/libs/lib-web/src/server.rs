//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! [`start_server`] loads configuration, prepares the database, builds the
//! [`AppState`], and serves the router from [`create_router`].

// region: --- Imports
use crate::handlers;
use crate::middleware::{log_requests, map_res, require_auth, stamp_req};
use crate::services::{mailer_from_config, Mailer};
use axum::{
    extract::FromRef,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use lib_auth::{Clock, PasswordHasher, PwdParams, SessionTokenService, SystemClock, VerificationTokenService};
use lib_core::{create_pool, Config, DbPool};
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub hasher: PasswordHasher,
    pub sessions: Arc<SessionTokenService>,
    pub verifications: Arc<VerificationTokenService>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Build the services from configuration.
    ///
    /// # Errors
    ///
    /// Fails on hasher parameters argon2 rejects, a TTL outside chrono's range, or an
    /// empty secret / non-positive TTL (`SigningFailure`).
    pub fn new(
        db: DbPool,
        config: Config,
        clock: Arc<dyn Clock>,
        mailer: Arc<dyn Mailer>,
    ) -> anyhow::Result<Self> {
        let hasher = PasswordHasher::new(PwdParams {
            memory_kib: config.pwd_memory_kib,
            iterations: config.pwd_iterations,
            parallelism: config.pwd_parallelism,
        })?;

        let sessions = SessionTokenService::new(
            &config.jwt_secret,
            ttl(config.session_ttl_secs, "JWT_EXP")?,
            clock.clone(),
        )?;

        let verifications = VerificationTokenService::new(
            config.verification_secret(),
            ttl(config.verification_ttl_secs, "VERIFICATION_EXP")?,
            clock,
        )?;

        Ok(Self {
            db,
            config: Arc::new(config),
            hasher,
            sessions: Arc::new(sessions),
            verifications: Arc::new(verifications),
            mailer,
        })
    }
}

fn ttl(secs: i64, name: &str) -> anyhow::Result<chrono::Duration> {
    chrono::Duration::try_seconds(secs).ok_or_else(|| anyhow::anyhow!("{} is out of range: {}", name, secs))
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for PasswordHasher {
    fn from_ref(state: &AppState) -> Self {
        state.hasher.clone()
    }
}

impl FromRef<AppState> for Arc<SessionTokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<VerificationTokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.verifications.clone()
    }
}

impl FromRef<AppState> for Arc<dyn Mailer> {
    fn from_ref(state: &AppState) -> Self {
        state.mailer.clone()
    }
}
// endregion: --- AppState

// region: --- Server Configuration
/// Server configuration
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080")
    pub bind_address: String,
    /// Database migrations path
    pub migrations_path: &'static str,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            migrations_path: "./migrations",
        }
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
/// Initialize and start the HTTP server
///
/// # Errors
///
/// This function will return an error if:
/// - Configuration loading or validation fails
/// - Database connection fails
/// - Database migrations fail
/// - Token services or the mail transport cannot be built
/// - Server binding fails
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let filter = match log_level.as_str() {
        "trace" => tracing_subscriber::EnvFilter::new("trace"),
        "debug" => tracing_subscriber::EnvFilter::new("debug"),
        "info" => tracing_subscriber::EnvFilter::new("info"),
        "warn" => tracing_subscriber::EnvFilter::new("warn"),
        "error" => tracing_subscriber::EnvFilter::new("error"),
        _ => tracing_subscriber::EnvFilter::new("info"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        warn!("Global tracing subscriber already installed, keeping it");
    }

    info!(" ACCOUNT SERVICE STARTING");
    info!(" Log level: {}", log_level);

    info!("Loading configuration...");
    let app_config = Config::load().map_err(|e| anyhow::anyhow!(e))?;

    info!("Database URL: {}", app_config.database_url);
    ensure_sqlite_dir(&app_config.database_url)?;

    info!("Connecting to database...");
    let pool = create_pool(&app_config.database_url).await?;

    info!(" Running database migrations from: {}", config.migrations_path);
    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(config.migrations_path)).await?;
    migrator.run(&pool).await?;
    info!(" Migrations complete");

    let mailer = mailer_from_config(&app_config)?;
    let state = AppState::new(pool, app_config, Arc::new(SystemClock), mailer)?;

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    info!(" SERVER READY: http://{}", config.bind_address);
    log_server_info();

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the parent directory of a file-backed SQLite database.
fn ensure_sqlite_dir(database_url: &str) -> anyhow::Result<()> {
    let Some(rest) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };

    let db_path = rest.split('?').next().unwrap_or(rest);
    if db_path.is_empty() || db_path == ":memory:" {
        return Ok(());
    }

    if let Some(parent) = std::path::Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            info!("Created database directory: {:?}", parent);
        }
    }
    info!("Database file will be at: {}", db_path);

    Ok(())
}

/// Create the application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    use axum::http::{header, HeaderValue, Method};

    let origins: Vec<HeaderValue> = [state.config.frontend_url.as_str()]
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    info!("[ROUTE SETUP] Registering HTTP routes...");

    let protected = Router::new()
        .route("/api/v1/user", get(handlers::user::get_user))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api/v1/register", post(handlers::auth::register))
        .route("/api/v1/login", post(handlers::auth::login))
        .route("/api/v1/logout", post(handlers::auth::logout))
        .route("/api/v1/verify-email", get(handlers::auth::verify_email))
        .route("/api/v1/verify-email/resend", post(handlers::auth::resend_verification))
        .merge(protected)
        .route("/health", get(|| async { "OK" }))
        .fallback(|| async {
            info!("[404 HANDLER] Unmatched route - returning 404");
            (axum::http::StatusCode::NOT_FOUND, "Route not found")
        })
        .with_state(state)
        .layer(from_fn(map_res))
        .layer(CookieManagerLayer::new())
        .layer(from_fn(log_requests))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<crate::middleware::RequestStamp>()
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                })
                .on_failure(|error: tower_http::classify::ServerErrorsFailureClass, latency: std::time::Duration, _span: &tracing::Span| {
                    tracing::error!(
                        error = ?error,
                        latency_ms = latency.as_millis(),
                        "[HTTP FAILURE] Error: {:?}, Latency: {}ms",
                        error,
                        latency.as_millis()
                    );
                }),
        )
        // Outermost after CORS, so the span and the logs both see the id
        .layer(from_fn(stamp_req))
        .layer(cors)
}

/// Log server information
fn log_server_info() {
    info!(" ACCOUNTS:");
    info!("   • POST /api/v1/register");
    info!("   • POST /api/v1/login");
    info!("   • POST /api/v1/logout");
    info!("   • GET  /api/v1/user (session required)");
    info!(" EMAIL VERIFICATION:");
    info!("   • GET  /api/v1/verify-email?token={{token}}");
    info!("   • POST /api/v1/verify-email/resend");
    info!(" HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_state_rejects_out_of_range_ttl() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("In-memory pool should open in test");
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-key-must-be-at-least-32-characters-long!".to_string(),
            verification_secret: None,
            session_ttl_secs: i64::MAX,
            verification_ttl_secs: 3600,
            pwd_memory_kib: 1024,
            pwd_iterations: 1,
            pwd_parallelism: 1,
            public_host: "http://localhost:8080".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            require_verified_email: true,
            cookie_secure: true,
            smtp: None,
        };

        let result = AppState::new(
            pool,
            config,
            Arc::new(SystemClock),
            Arc::new(crate::services::LogMailer::new("http://localhost:8080")),
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_ensure_sqlite_dir_skips_memory() {
        assert!(ensure_sqlite_dir("sqlite::memory:").is_ok());
        assert!(ensure_sqlite_dir("postgres://localhost/db").is_ok());
    }
}
