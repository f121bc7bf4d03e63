// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transactional email delivery.
//!
//! [`Mailer`] is what handlers use. It wraps a [`MailTransport`] (SMTP in
//! production, a logging transport when `SMTP_HOST` is unset) and bounds
//! every send with the configured outbound timeout.

use crate::config::{Config, SmtpConfig};
use futures_util::future::BoxFuture;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use std::time::Duration;

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    #[error("Email send timed out after {0:?}")]
    Timeout(Duration),

    /// The transport refused the message for a non-SMTP reason.
    #[error("Email rejected: {0}")]
    Rejected(String),
}

/// A plain-text message ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Something that can deliver an [`OutboundEmail`].
pub trait MailTransport: Send + Sync {
    fn send<'a>(&'a self, email: &'a OutboundEmail) -> BoxFuture<'a, Result<(), EmailError>>;
}

// ─── SMTP ──────────────────────────────────────────────────────

/// SMTP delivery via `lettre`, with STARTTLS.
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    pub fn new(smtp: &SmtpConfig, from: &str) -> Result<Self, EmailError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?.port(smtp.port);

        if let (Some(user), Some(pass)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: from.parse()?,
        })
    }

    fn build_message(&self, email: &OutboundEmail) -> Result<Message, EmailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(email.to.parse()?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN);

        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(reply_to.parse()?);
        }

        builder
            .body(email.body.clone())
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

impl MailTransport for SmtpTransport {
    fn send<'a>(&'a self, email: &'a OutboundEmail) -> BoxFuture<'a, Result<(), EmailError>> {
        Box::pin(async move {
            let message = self.build_message(email)?;
            self.transport.send(message).await?;
            Ok(())
        })
    }
}

// ─── Log only ──────────────────────────────────────────────────

/// Transport used when SMTP is not configured: logs and drops the message.
pub struct LogTransport;

impl MailTransport for LogTransport {
    fn send<'a>(&'a self, email: &'a OutboundEmail) -> BoxFuture<'a, Result<(), EmailError>> {
        Box::pin(async move {
            tracing::warn!(
                to = %email.to,
                subject = %email.subject,
                "SMTP not configured, email not delivered"
            );
            Ok(())
        })
    }
}

// ─── Mailer ────────────────────────────────────────────────────

/// Shared handle used by request handlers.
#[derive(Clone)]
pub struct Mailer {
    transport: Arc<dyn MailTransport>,
    timeout: Duration,
}

impl Mailer {
    pub fn new(transport: Arc<dyn MailTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Build the mailer described by `config` (SMTP if configured, else log-only).
    pub fn from_config(config: &Config) -> Result<Self, EmailError> {
        let transport: Arc<dyn MailTransport> = match &config.smtp {
            Some(smtp) => {
                tracing::info!(host = %smtp.host, port = smtp.port, "SMTP transport configured");
                Arc::new(SmtpTransport::new(smtp, &config.mail_from)?)
            }
            None => {
                tracing::warn!("SMTP_HOST not set, outbound email will only be logged");
                Arc::new(LogTransport)
            }
        };
        Ok(Self::new(transport, config.outbound_timeout))
    }

    /// Send one message. Single attempt, no retry.
    pub async fn send(&self, email: &OutboundEmail) -> Result<(), EmailError> {
        tokio::time::timeout(self.timeout, self.transport.send(email))
            .await
            .map_err(|_| EmailError::Timeout(self.timeout))??;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Hang;

    impl MailTransport for Hang {
        fn send<'a>(&'a self, _email: &'a OutboundEmail) -> BoxFuture<'a, Result<(), EmailError>> {
            Box::pin(std::future::pending())
        }
    }

    fn message() -> OutboundEmail {
        OutboundEmail {
            to: "a@x.com".to_string(),
            reply_to: None,
            subject: "Hello".to_string(),
            body: "Body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_hung_transport_times_out() {
        let mailer = Mailer::new(Arc::new(Hang), Duration::from_millis(20));
        let err = mailer.send(&message()).await.unwrap_err();
        assert!(matches!(err, EmailError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_log_transport_succeeds() {
        let mailer = Mailer::new(Arc::new(LogTransport), Duration::from_secs(1));
        assert!(mailer.send(&message()).await.is_ok());
    }

    #[test]
    fn test_smtp_rejects_bad_sender() {
        let smtp = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: None,
            password: None,
        };
        assert!(matches!(
            SmtpTransport::new(&smtp, "not an address"),
            Err(EmailError::Address(_))
        ));
    }
}
