//! SMTP delivery adapter built on lettre.

use async_trait::async_trait;
use core_config::{env_or_default, env_required, ConfigError};
use eyre::{Result, WrapErr};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use super::EmailSender;
use crate::entity::Notification;

/// SMTP endpoint and credentials.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub use_tls: bool,
}

impl SmtpConfig {
    /// Production config from `EMAIL_SMTP_*` variables. Host defaults to
    /// `smtp.gmail.com`, port to 587; credentials are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_raw = env_or_default("EMAIL_SMTP_PORT", "587");
        let port = port_raw.parse().map_err(|e| ConfigError::ParseError {
            key: "EMAIL_SMTP_PORT".to_string(),
            details: format!("{e}"),
        })?;

        Ok(Self {
            host: env_or_default("EMAIL_SMTP_HOST", "smtp.gmail.com"),
            port,
            username: env_required("EMAIL_SMTP_USERNAME")?,
            password: env_required("EMAIL_SMTP_PASSWORD")?,
            from_email: env_or_default("EMAIL_FROM_ADDRESS", "noreply@localhost"),
            use_tls: true,
        })
    }

    /// Local Mailpit config: localhost:1025, no auth, no TLS.
    pub fn mailpit() -> Self {
        Self {
            host: env_or_default("EMAIL_SMTP_HOST", "localhost"),
            port: env_or_default("EMAIL_SMTP_PORT", "1025")
                .parse()
                .unwrap_or(1025),
            username: String::new(),
            password: String::new(),
            from_email: env_or_default("EMAIL_FROM_ADDRESS", "noreply@localhost"),
            use_tls: false,
        }
    }
}

/// Sends notifications over SMTP. Performs exactly one attempt per call;
/// retry lives in [`crate::Mailer`].
pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
}

impl SmtpSender {
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let transport = if config.use_tls {
            let creds = Credentials::new(config.username.clone(), config.password.clone());
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .wrap_err("Failed to create SMTP relay")?
                .credentials(creds)
                .port(config.port)
                .build()
        } else if !config.username.is_empty() {
            let creds = Credentials::new(config.username.clone(), config.password.clone());
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .credentials(creds)
                .port(config.port)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .build()
        };

        Ok(Self {
            transport,
            from_email: config.from_email,
        })
    }

    fn build_message(&self, notification: &Notification) -> Result<Message> {
        let from: Mailbox = format!("{} <{}>", notification.from_name, self.from_email)
            .parse()
            .wrap_err("Invalid from address")?;

        let mut builder = Message::builder()
            .from(from)
            .subject(&notification.subject);

        for recipient in &notification.to_list {
            let to: Mailbox =
                format!("{} <{}>", recipient.user_name, recipient.email_addr)
                    .parse()
                    .wrap_err("Invalid recipient address")?;
            builder = builder.to(to);
        }

        builder
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .wrap_err("Failed to build message")
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let message = self.build_message(notification)?;

        self.transport
            .send(message)
            .await
            .wrap_err("Failed to send email via SMTP")?;

        tracing::debug!(
            subject = %notification.subject,
            recipients = notification.to_list.len(),
            "Email handed to SMTP transport"
        );

        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
