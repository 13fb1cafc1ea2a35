//! # Email-Verification Tokens
//!
//! Short-lived tokens binding an email address, mailed to the user to confirm the
//! address before the account can log in.

use super::{check_window, Error, Signer, TokenPurpose};
use crate::clock::Clock;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Claims carried by an email-verification token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationClaims {
    /// Email address being verified
    pub sub: String,
    pub purpose: TokenPurpose,
    pub iat: i64,
    pub exp: i64,
}

pub struct VerificationTokenService {
    signer: Signer,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl VerificationTokenService {
    /// `secret` may be the session secret; the purpose claim keeps the kinds apart.
    pub fn new(secret: &str, ttl: Duration, clock: Arc<dyn Clock>) -> Result<Self, Error> {
        if ttl <= Duration::zero() {
            return Err(Error::SigningFailure("verification TTL must be positive".to_string()));
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

    pub fn issue(&self, email: &str) -> Result<String, Error> {
        if email.trim().is_empty() {
            return Err(Error::InvalidSubject);
        }

        let now = self.clock.now().timestamp();
        let claims = VerificationClaims {
            sub: email.to_string(),
            purpose: TokenPurpose::EmailVerification,
            iat: now,
            exp: now + self.ttl.num_seconds(),
        };

        self.signer.sign(&claims)
    }

    pub fn validate(&self, token: &str) -> Result<VerificationClaims, Error> {
        let claims: VerificationClaims = self.signer.open(token, TokenPurpose::EmailVerification)?;

        if claims.sub.trim().is_empty() {
            return Err(Error::MalformedToken);
        }

        check_window(claims.iat, claims.exp, self.clock.now().timestamp())?;

        Ok(claims)
    }
}
