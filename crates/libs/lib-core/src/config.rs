//! # Application Configuration
//!
//! Configuration loaded once from environment variables at startup, validated to
//! fail fast, and then passed explicitly to whatever needs it. There is no global
//! instance.
//!
//! ```rust,no_run
//! use lib_core::Config;
//!
//! let config = Config::load().expect("valid configuration");
//! println!("sessions last {}s", config.session_ttl_secs);
//! ```

use crate::error::{AppError, Result};
use lib_utils::envs::{get_env, get_env_or, get_env_parse_or};
use std::fmt;

/// Lowest accepted Argon2 memory cost (KiB).
pub const MIN_PWD_MEMORY_KIB: u32 = 19_456;
/// Lowest accepted Argon2 pass count.
pub const MIN_PWD_ITERATIONS: u32 = 2;
/// Minimum signing secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;
/// Longest accepted token lifetime (one year) for either token kind.
pub const MAX_TOKEN_TTL_SECS: i64 = 3600 * 24 * 365;

/// Application configuration.
#[derive(Clone)]
pub struct Config {
    /// SQLite database connection URL
    pub database_url: String,

    /// Secret for signing session tokens. **At least 32 bytes.**
    pub jwt_secret: String,

    /// Secret for email-verification tokens. Falls back to `jwt_secret` when unset.
    pub verification_secret: Option<String>,

    /// Session token lifetime in seconds (cookie Max-Age too)
    pub session_ttl_secs: i64,

    /// Verification token lifetime in seconds. Must be shorter than the session TTL.
    pub verification_ttl_secs: i64,

    /// Argon2 memory cost (KiB)
    pub pwd_memory_kib: u32,
    /// Argon2 passes
    pub pwd_iterations: u32,
    /// Argon2 lanes
    pub pwd_parallelism: u32,

    /// Public base URL used to build verification links
    pub public_host: String,

    /// Frontend origin allowed by CORS
    pub frontend_url: String,

    /// Refuse login until the email address is verified
    pub require_verified_email: bool,

    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,

    /// Outgoing mail. `None` logs instead of sending.
    pub smtp: Option<SmtpConfig>,
}

/// SMTP relay settings.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender mailbox, e.g. `Accounts <no-reply@example.com>`
    pub from: String,
}

impl Config {
    /// Load `.env` (if present), read the environment, and validate.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from environment variables without validating it.
    pub fn from_env() -> Result<Self> {
        let database_url = get_env_or("DATABASE_URL", "sqlite:data/auth.db");
        let jwt_secret = get_env("JWT_SECRET").map_err(config_err)?;
        let verification_secret = get_env("VERIFICATION_SECRET").ok();

        let smtp = match get_env("SMTP_HOST") {
            Ok(host) => Some(SmtpConfig {
                host,
                port: get_env_parse_or("SMTP_PORT", 587).map_err(config_err)?,
                username: get_env_or("SMTP_USERNAME", ""),
                password: get_env_or("SMTP_PASSWORD", ""),
                from: get_env_or("SMTP_FROM", "no-reply@localhost"),
            }),
            Err(_) => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            verification_secret,
            session_ttl_secs: get_env_parse_or("JWT_EXP", 3600 * 24 * 7).map_err(config_err)?,
            verification_ttl_secs: get_env_parse_or("VERIFICATION_EXP", 3600).map_err(config_err)?,
            pwd_memory_kib: get_env_parse_or("PWD_MEMORY_KIB", MIN_PWD_MEMORY_KIB).map_err(config_err)?,
            pwd_iterations: get_env_parse_or("PWD_ITERATIONS", MIN_PWD_ITERATIONS).map_err(config_err)?,
            pwd_parallelism: get_env_parse_or("PWD_PARALLELISM", 1).map_err(config_err)?,
            public_host: get_env_or("PUBLIC_HOST", "http://localhost:8080"),
            frontend_url: get_env_or("FRONT_URL", "http://localhost:3000"),
            require_verified_email: get_env_parse_or("REQUIRE_VERIFIED_EMAIL", true).map_err(config_err)?,
            cookie_secure: get_env_parse_or("COOKIE_SECURE", true).map_err(config_err)?,
            smtp,
        })
    }

    /// Validate configuration values against security rules.
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Config(format!(
                "JWT_SECRET must be at least {MIN_SECRET_LEN} characters long"
            )));
        }

        if let Some(secret) = &self.verification_secret {
            if secret.len() < MIN_SECRET_LEN {
                return Err(AppError::Config(format!(
                    "VERIFICATION_SECRET must be at least {MIN_SECRET_LEN} characters long"
                )));
            }
        }

        if self.session_ttl_secs <= 0 || self.session_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(AppError::Config(format!(
                "JWT_EXP must be between 1 and {MAX_TOKEN_TTL_SECS} seconds"
            )));
        }

        if self.verification_ttl_secs <= 0 || self.verification_ttl_secs >= self.session_ttl_secs {
            return Err(AppError::Config(
                "VERIFICATION_EXP must be positive and shorter than JWT_EXP".to_string(),
            ));
        }

        if self.pwd_memory_kib < MIN_PWD_MEMORY_KIB || self.pwd_iterations < MIN_PWD_ITERATIONS {
            return Err(AppError::Config(format!(
                "PWD_MEMORY_KIB must be >= {MIN_PWD_MEMORY_KIB} and PWD_ITERATIONS >= {MIN_PWD_ITERATIONS}"
            )));
        }

        if self.pwd_parallelism == 0 {
            return Err(AppError::Config("PWD_PARALLELISM must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Secret for verification tokens: the dedicated one if configured, else the session secret.
    pub fn verification_secret(&self) -> &str {
        self.verification_secret.as_deref().unwrap_or(&self.jwt_secret)
    }
}

fn config_err(err: lib_utils::envs::Error) -> AppError {
    AppError::Config(err.to_string())
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("jwt_secret", &"<redacted>")
            .field("verification_secret", &self.verification_secret.as_ref().map(|_| "<redacted>"))
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("verification_ttl_secs", &self.verification_ttl_secs)
            .field("pwd_memory_kib", &self.pwd_memory_kib)
            .field("pwd_iterations", &self.pwd_iterations)
            .field("pwd_parallelism", &self.pwd_parallelism)
            .field("public_host", &self.public_host)
            .field("frontend_url", &self.frontend_url)
            .field("require_verified_email", &self.require_verified_email)
            .field("cookie_secure", &self.cookie_secure)
            .field("smtp", &self.smtp)
            .finish()
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}
