//! # Password Hashing
//!
//! One-way, salted password hashing and constant-time verification using Argon2id.
//!
//! A [`Credential`] is the PHC string produced by [`PasswordHasher::hash`]. It embeds
//! the algorithm, cost parameters and salt, so verification needs nothing else:
//!
//! ```text
//! $argon2id$v=19$m=19456,t=2,p=1$<salt>$<digest>
//! ```
//!
//! Hashing is deliberately expensive. Async callers should run it on a blocking pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::fmt;
use thiserror::Error;
use tracing::warn;

const DUMMY_PASSWORD: &str = "timing-equalizer-not-a-real-password";

// region:    --- Error
#[derive(Debug, Error)]
pub enum Error {
    /// Entropy or memory exhaustion while computing a hash.
    #[error("Password hashing failed: {0}")]
    HashingFailure(String),

    #[error("Invalid password hashing parameters: {0}")]
    InvalidParams(String),
}
// endregion: --- Error

// region:    --- Credential
/// Stored, one-way password representation (Argon2 PHC string).
///
/// Deliberately not `Serialize` and not `Display`; `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a value read back from storage.
    pub fn from_stored(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// Borrow the PHC string for persistence.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
// endregion: --- Credential

// region:    --- Params
/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwdParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl Default for PwdParams {
    /// 19 MiB, 2 passes, 1 lane. Comfortably above bcrypt cost 10.
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}
// endregion: --- Params

/// Hashes and verifies passwords with configured Argon2id parameters.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    dummy: Credential,
}

impl PasswordHasher {
    /// Build a hasher. Fails if argon2 rejects the parameters.
    pub fn new(params: PwdParams) -> Result<Self, Error> {
        let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| Error::InvalidParams(e.to_string()))?;

        let dummy = hash_with(&params, DUMMY_PASSWORD)?;

        Ok(Self { params, dummy })
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<Credential, Error> {
        hash_with(&self.params, plaintext)
    }

    /// Check a plaintext password against a stored credential.
    ///
    /// Mismatch is `false`, never an error. A credential that cannot be parsed is
    /// logged and also yields `false`.
    pub fn verify(&self, credential: &Credential, plaintext: &str) -> bool {
        let parsed = match PasswordHash::new(credential.as_str()) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("[PWD] Stored credential is not a valid PHC string: {}", e);
                return false;
            }
        };

        // Cost and salt come from the credential itself; the digest comparison is constant-time.
        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => true,
            Err(argon2::password_hash::Error::Password) => false,
            Err(e) => {
                warn!("[PWD] Credential verification failed: {}", e);
                false
            }
        }
    }

    /// Spend the same work as a real verification, for callers that have no credential
    /// to check (e.g. unknown account). Always `false`.
    pub fn verify_dummy(&self, plaintext: &str) -> bool {
        let _ = self.verify(&self.dummy, plaintext);
        false
    }
}

fn hash_with(params: &Params, plaintext: &str) -> Result<Credential, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());

    let phc = argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| Error::HashingFailure(e.to_string()))?
        .to_string();

    Ok(Credential(phc))
}
