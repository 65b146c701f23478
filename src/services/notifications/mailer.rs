//! Outgoing e-mail transports.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::{EmailBackend, EmailConfig, SmtpTls};
use crate::errors::Result;

/// A plain-text message to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let builder = match config.tls {
            SmtpTls::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str())
            }
            SmtpTls::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            }
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
        }
        .port(config.port);

        let builder = match (&config.username, &config.password) {
            (Some(username), password) => builder.credentials(Credentials::new(
                username.clone(),
                password.clone().unwrap_or_default(),
            )),
            (None, _) => builder,
        };

        Ok(Self {
            transport: builder.build(),
            from: config.from.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(message.to.parse()?)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())?;

        self.transport.send(email).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "smtp"
    }
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "E-mail (console backend):\n{}",
            message.body
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "console"
    }
}

pub fn build_mailer(config: &EmailConfig) -> Result<Arc<dyn Mailer>> {
    Ok(match config.backend {
        EmailBackend::Smtp => Arc::new(SmtpMailer::from_config(config)?),
        EmailBackend::Console => Arc::new(ConsoleMailer),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn console_mailer_accepts_everything() {
        let mailer = ConsoleMailer;
        let message = EmailMessage {
            to: "someone@example.com".into(),
            subject: "سلام".into(),
            body: "متن".into(),
        };
        assert!(mailer.send(&message).await.is_ok());
        assert_eq!(mailer.backend_name(), "console");
    }

    #[tokio::test]
    async fn smtp_mailer_rejects_bad_sender() {
        let config = EmailConfig {
            backend: EmailBackend::Smtp,
            from: "not an address".into(),
            tls: SmtpTls::None,
            ..Default::default()
        };
        assert!(SmtpMailer::from_config(&config).is_err());
    }
}
