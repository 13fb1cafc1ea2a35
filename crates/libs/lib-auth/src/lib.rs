//! # Authentication Library
//!
//! Password hashing, signed session tokens, and email-verification tokens.
//!
//! Everything here is synchronous and free of I/O. Secrets, TTLs and the clock are
//! injected at construction time so the services can be built once at startup and
//! shared read-only across request tasks.

pub mod clock;
pub mod pwd;
pub mod token;

pub use clock::{Clock, FixedClock, SystemClock};
pub use pwd::{Credential, PasswordHasher, PwdParams};
pub use token::{
    SessionClaims, SessionTokenService, TokenPurpose, VerificationClaims,
    VerificationTokenService,
};
