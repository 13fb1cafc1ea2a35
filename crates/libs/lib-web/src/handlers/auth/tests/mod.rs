//! # Auth Handler Tests
//!
//! Drive the real router with `oneshot` against an in-memory database, a fixed
//! clock, cheap hashing parameters, and a mailer that records what it sends.

mod register;

use crate::server::{create_router, AppState};
use crate::services::{MailError, Mailer};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use lib_auth::FixedClock;
use lib_core::model::store::{User, UserForCreate, UserRepository};
use lib_core::{Config, DbPool};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-must-be-at-least-32-characters-long!";
pub const T0: i64 = 1_700_000_000;
pub const PASSWORD: &str = "TestPassword123!";

/// Setup test database with the real migrations.
///
/// One connection: every connection to `sqlite::memory:` is its own database.
pub async fn setup_test_db() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    sqlx::migrate!("../../../migrations")
        .run(&pool)
        .await
        .expect("Migrations should succeed in test");

    pool
}

/// Create test config with cheap hashing parameters
pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        verification_secret: None,
        session_ttl_secs: 604_800,
        verification_ttl_secs: 3600,
        pwd_memory_kib: 1024,
        pwd_iterations: 1,
        pwd_parallelism: 1,
        public_host: "http://localhost:8080".to_string(),
        frontend_url: "http://localhost:3000".to_string(),
        require_verified_email: true,
        cookie_secure: true,
        smtp: None,
    }
}

// region: --- Mailers

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub email: String,
    pub token: String,
}

pub struct RecordingMailer {
    tx: mpsc::UnboundedSender<SentMail>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification_email(&self, email: &str, token: &str) -> Result<(), MailError> {
        self.tx
            .send(SentMail {
                email: email.to_string(),
                token: token.to_string(),
            })
            .map_err(|e| MailError::Transport(e.to_string()))
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_verification_email(&self, _email: &str, _token: &str) -> Result<(), MailError> {
        Err(MailError::Transport("relay unavailable".to_string()))
    }
}

// endregion: --- Mailers

// region: --- Test App

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub clock: FixedClock,
    pub state: AppState,
    pub outbox: mpsc::UnboundedReceiver<SentMail>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let (tx, outbox) = mpsc::unbounded_channel();
        Self::build(config, Arc::new(RecordingMailer { tx }), outbox).await
    }

    /// App whose mail transport always fails; the outbox stays empty.
    pub async fn with_failing_mailer() -> Self {
        let (_tx, outbox) = mpsc::unbounded_channel();
        Self::build(test_config(), Arc::new(FailingMailer), outbox).await
    }

    async fn build(config: Config, mailer: Arc<dyn Mailer>, outbox: mpsc::UnboundedReceiver<SentMail>) -> Self {
        let pool = setup_test_db().await;
        let clock = FixedClock::at_timestamp(T0);

        let state = AppState::new(pool.clone(), config, Arc::new(clock.clone()), mailer)
            .expect("App state should build in test");

        Self {
            router: create_router(state.clone()),
            pool,
            clock,
            state,
            outbox,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router should respond in test")
    }

    /// Wait for the next detached mail send.
    pub async fn next_mail(&mut self) -> SentMail {
        tokio::time::timeout(Duration::from_secs(5), self.outbox.recv())
            .await
            .expect("Verification mail should be dispatched in test")
            .expect("Outbox should stay open in test")
    }

    /// Insert a user directly, bypassing the HTTP layer.
    pub async fn create_user(&self, email: &str, password: &str, verified: bool) -> User {
        let credential = self
            .state
            .hasher
            .hash(password)
            .expect("Password hashing should succeed in test");

        let user = UserRepository::create(
            &self.pool,
            UserForCreate::new("Test", "User", email, credential.as_str()),
        )
        .await
        .expect("User creation should succeed in test");

        if verified {
            UserRepository::mark_email_verified(&self.pool, email)
                .await
                .expect("Verification should succeed in test");
        }

        UserRepository::find_by_id(&self.pool, user.id)
            .await
            .expect("User lookup should succeed in test")
            .expect("User should exist after creation")
    }

    /// Log in through the router and return the session token.
    pub async fn login_token(&self, email: &str, password: &str) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/api/v1/login",
                &serde_json::json!({ "email": email, "password": password }),
            ))
            .await;
        let body = body_json(response).await;

        body["token"]
            .as_str()
            .expect("Login should return a token in test")
            .to_string()
    }
}

// endregion: --- Test App

// region: --- Request Helpers

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("Request should build in test")
}

/// JSON-typed request with a body that is sent as-is, valid or not.
pub fn raw_json_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("Request should build in test")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("Request should build in test")
}

pub fn bearer_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .expect("Request should build in test")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Body should be readable in test");
    serde_json::from_slice(&body).expect("Body should be JSON in test")
}

pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

// endregion: --- Request Helpers
