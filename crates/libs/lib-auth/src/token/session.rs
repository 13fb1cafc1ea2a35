//! # Session Tokens
//!
//! Stateless session tokens binding a user id. Never stored server-side; they die
//! only by expiry.

use super::{check_window, Error, Signer, TokenPurpose};
use crate::clock::Clock;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: i64,
    pub purpose: TokenPurpose,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

/// Issues and validates session tokens.
pub struct SessionTokenService {
    signer: Signer,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionTokenService {
    /// Fails with `SigningFailure` on an empty secret or a non-positive TTL.
    pub fn new(secret: &str, ttl: Duration, clock: Arc<dyn Clock>) -> Result<Self, Error> {
        if ttl <= Duration::zero() {
            return Err(Error::SigningFailure("session TTL must be positive".to_string()));
        }

        Ok(Self {
            signer: Signer::new(secret)?,
            ttl,
            clock,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `user_id`, valid from now until now + TTL.
    pub fn issue(&self, user_id: i64) -> Result<String, Error> {
        if user_id <= 0 {
            return Err(Error::InvalidSubject);
        }

        let now = self.clock.now().timestamp();
        let claims = SessionClaims {
            sub: user_id,
            purpose: TokenPurpose::Session,
            iat: now,
            exp: now + self.ttl.num_seconds(),
        };

        self.signer.sign(&claims)
    }

    pub fn validate(&self, token: &str) -> Result<SessionClaims, Error> {
        let claims: SessionClaims = self.signer.open(token, TokenPurpose::Session)?;

        if claims.sub <= 0 {
            return Err(Error::MalformedToken);
        }

        check_window(claims.iat, claims.exp, self.clock.now().timestamp())?;

        Ok(claims)
    }
}
