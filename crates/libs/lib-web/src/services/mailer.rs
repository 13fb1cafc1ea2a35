//! # Verification Mail
//!
//! Outgoing mail for email-address verification.
//!
//! Delivery is fire-and-forget: handlers call [`dispatch_verification_email`], which
//! spawns a detached task. A failed send is logged and never retried, and it never
//! changes the HTTP response.
//!
//! ## Transports
//!
//! - [`SmtpMailer`]: lettre async SMTP (STARTTLS relay with credentials)
//! - [`LogMailer`]: used when SMTP is not configured; logs instead of sending

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use lib_core::{Config, SmtpConfig};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

const VERIFICATION_SUBJECT: &str = "Verify your email address";
const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Sends verification mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_email(&self, email: &str, token: &str) -> Result<(), MailError>;
}

/// Link the user follows to verify their address.
pub fn verification_link(public_host: &str, token: &str) -> String {
    format!(
        "{}/api/v1/verify-email?token={}",
        public_host.trim_end_matches('/'),
        token
    )
}

fn verification_body(link: &str) -> String {
    format!(
        "Welcome!\n\
        \n\
        Please confirm your email address by opening the link below:\n\
        \n\
        {}\n\
        \n\
        The link expires soon. If you did not create an account, ignore this message.\n",
        link
    )
}

/// Pick the transport for this configuration.
pub fn mailer_from_config(config: &Config) -> Result<Arc<dyn Mailer>, MailError> {
    match &config.smtp {
        Some(smtp) => {
            info!("[MAIL] Using SMTP relay {}:{}", smtp.host, smtp.port);
            Ok(Arc::new(SmtpMailer::new(smtp, &config.public_host)?))
        }
        None => {
            info!("[MAIL] SMTP not configured, verification mail will only be logged");
            Ok(Arc::new(LogMailer::new(&config.public_host)))
        }
    }
}

// region: --- SmtpMailer

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    public_host: String,
}

impl SmtpMailer {
    pub fn new(smtp: &SmtpConfig, public_host: &str) -> Result<Self, MailError> {
        let from: Mailbox = smtp
            .from
            .parse()
            .map_err(|e| MailError::Address(format!("SMTP_FROM: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .credentials(Credentials::new(smtp.username.clone(), smtp.password.clone()))
            .port(smtp.port)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            transport,
            from,
            public_host: public_host.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification_email(&self, email: &str, token: &str) -> Result<(), MailError> {
        let to: Mailbox = email
            .parse()
            .map_err(|e| MailError::Address(format!("{}: {}", email, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(VERIFICATION_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(verification_body(&verification_link(&self.public_host, token)))
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        debug!("[MAIL] Verification mail accepted by relay for {}", email);
        Ok(())
    }
}

// endregion: --- SmtpMailer

// region: --- LogMailer

pub struct LogMailer {
    public_host: String,
}

impl LogMailer {
    pub fn new(public_host: &str) -> Self {
        Self {
            public_host: public_host.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_email(&self, email: &str, _token: &str) -> Result<(), MailError> {
        info!(
            email = %email,
            link_host = %self.public_host,
            "[MAIL] Verification mail not sent (no SMTP relay configured)"
        );
        Ok(())
    }
}

// endregion: --- LogMailer

/// Send a verification mail on a detached task.
///
/// The handle is returned for tests; handlers drop it.
pub fn dispatch_verification_email(mailer: Arc<dyn Mailer>, email: String, token: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        match mailer.send_verification_email(&email, &token).await {
            Ok(()) => debug!("[MAIL] Verification mail dispatched to {}", email),
            Err(e) => error!("[MAIL] Failed to send verification mail to {}: {}", email, e),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CapturingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for CapturingMailer {
        async fn send_verification_email(&self, email: &str, token: &str) -> Result<(), MailError> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push((email.to_string(), token.to_string()));
            }
            Ok(())
        }
    }

    struct BrokenMailer;

    #[async_trait]
    impl Mailer for BrokenMailer {
        async fn send_verification_email(&self, _email: &str, _token: &str) -> Result<(), MailError> {
            Err(MailError::Transport("connection refused".to_string()))
        }
    }

    #[test]
    fn test_verification_link() {
        assert_eq!(
            verification_link("https://accounts.example.com/", "a.b.c"),
            "https://accounts.example.com/api/v1/verify-email?token=a.b.c"
        );
        assert_eq!(
            verification_link("http://localhost:8080", "x.y.z"),
            "http://localhost:8080/api/v1/verify-email?token=x.y.z"
        );
    }

    #[test]
    fn test_body_contains_link() {
        let link = verification_link("http://localhost:8080", "x.y.z");
        assert!(verification_body(&link).contains(&link));
    }

    #[tokio::test]
    async fn test_dispatch_delivers() {
        let mailer = Arc::new(CapturingMailer {
            sent: Mutex::new(Vec::new()),
        });

        dispatch_verification_email(mailer.clone(), "ada@example.com".to_string(), "t.o.k".to_string())
            .await
            .expect("Dispatch task should finish in test");

        let sent = mailer.sent.lock().expect("Lock should not be poisoned in test");
        assert_eq!(sent.as_slice(), &[("ada@example.com".to_string(), "t.o.k".to_string())]);
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failure() {
        let handle = dispatch_verification_email(
            Arc::new(BrokenMailer),
            "ada@example.com".to_string(),
            "t.o.k".to_string(),
        );

        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        let mailer = LogMailer::new("http://localhost:8080");
        assert!(mailer.send_verification_email("ada@example.com", "t.o.k").await.is_ok());
    }

    #[tokio::test]
    async fn test_smtp_mailer_rejects_bad_from() {
        let smtp = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: "secret".to_string(),
            from: "not an address".to_string(),
        };

        assert!(matches!(
            SmtpMailer::new(&smtp, "http://localhost:8080"),
            Err(MailError::Address(_))
        ));
    }
}
