//! # Services Layer
//!
//! Integrations the HTTP handlers call out to.
//!
//! ## Module Organization
//!
//! - [`mailer`] - Verification mail (SMTP relay or log-only)

pub mod mailer;

pub use mailer::{dispatch_verification_email, mailer_from_config, LogMailer, MailError, Mailer, SmtpMailer};
