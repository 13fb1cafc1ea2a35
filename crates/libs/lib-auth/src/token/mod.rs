//! # Signed Tokens
//!
//! HMAC-SHA256 signed, time-limited tokens (compact JWS) for two purposes:
//!
//! - [`SessionTokenService`]: binds a user id, long-lived (default one week).
//! - [`VerificationTokenService`]: binds an email address, short-lived.
//!
//! Every token carries a `purpose` claim that is checked on validation, so a token
//! minted for one purpose is rejected by the other service even when both share a
//! secret.
//!
//! Validation order: structure, signature, purpose, claim shape, then the
//! `iat <= now < exp` window against the injected clock (no leeway).

// region:    --- Modules
mod session;
mod verification;

pub use session::{SessionClaims, SessionTokenService};
pub use verification::{VerificationClaims, VerificationTokenService};
// endregion: --- Modules

use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

// region:    --- Error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Secret or TTL misconfiguration, or the encoder refused the claims.
    #[error("Token signing failed: {0}")]
    SigningFailure(String),

    /// Refused to issue a token for an empty or non-positive subject.
    #[error("Token subject is empty or invalid")]
    InvalidSubject,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token signature mismatch")]
    SignatureMismatch,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token not yet valid")]
    TokenNotYetValid,

    #[error("Wrong token purpose: expected {expected}, found {found}")]
    WrongTokenPurpose {
        expected: TokenPurpose,
        found: TokenPurpose,
    },
}
// endregion: --- Error

// region:    --- Purpose
/// What a token was minted for. Serialized as the `purpose` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenPurpose {
    Session,
    EmailVerification,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Session => "session",
            TokenPurpose::EmailVerification => "email-verification",
        }
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
// endregion: --- Purpose

// region:    --- Signer
/// HS256 signer/verifier shared by both token services.
pub(crate) struct Signer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Signer {
    pub(crate) fn new(secret: &str) -> Result<Self, Error> {
        if secret.is_empty() {
            return Err(Error::SigningFailure("signing secret is empty".to_string()));
        }

        // Time and subject checks happen against the injected clock, after the purpose check.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::new();

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub(crate) fn sign<C: Serialize>(&self, claims: &C) -> Result<String, Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| Error::SigningFailure(e.to_string()))
    }

    /// Verify structure, signature and purpose, then deserialize the claims.
    pub(crate) fn open<C: DeserializeOwned>(&self, token: &str, expected: TokenPurpose) -> Result<C, Error> {
        check_structure(token)?;

        let data = decode::<Value>(token, &self.decoding, &self.validation).map_err(|e| match e.kind() {
            // Header and claims segments already passed the structural check, so a
            // base64 failure here is in the signature segment.
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::Base64(_) => {
                Error::SignatureMismatch
            }
            _ => Error::MalformedToken,
        })?;

        let found = data
            .claims
            .get("purpose")
            .cloned()
            .and_then(|purpose| serde_json::from_value::<TokenPurpose>(purpose).ok())
            .ok_or(Error::MalformedToken)?;

        if found != expected {
            return Err(Error::WrongTokenPurpose { expected, found });
        }

        serde_json::from_value(data.claims).map_err(|_| Error::MalformedToken)
    }
}

/// Exactly three non-empty segments; header and claims must be base64url JSON objects.
fn check_structure(token: &str) -> Result<(), Error> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, claims, signature] = segments.as_slice() else {
        return Err(Error::MalformedToken);
    };

    if signature.is_empty() {
        return Err(Error::MalformedToken);
    }

    for segment in [header, claims] {
        let bytes = lib_utils::b64u_decode(segment).map_err(|_| Error::MalformedToken)?;
        let json: Value = serde_json::from_slice(&bytes).map_err(|_| Error::MalformedToken)?;
        if !json.is_object() {
            return Err(Error::MalformedToken);
        }
    }

    Ok(())
}
// endregion: --- Signer

/// Accept iff `iat <= now < exp`. The `now == exp` boundary is expired.
pub(crate) fn check_window(iat: i64, exp: i64, now: i64) -> Result<(), Error> {
    if now >= exp {
        return Err(Error::TokenExpired);
    }
    if now < iat {
        return Err(Error::TokenNotYetValid);
    }
    Ok(())
}
