//! Mail transport collaborator.
//!
//! Fire-and-forget from the engine's point of view, but awaited for
//! completion before the reset acknowledgement returns.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use thimble_core::Email;

use crate::config::MailConfig;

/// Errors that can occur when sending mail.
#[derive(Debug, Error)]
pub enum MailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build the message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid from/to address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

/// Sends transactional mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send an HTML email.
    async fn send(&self, to: &Email, subject: &str, html_body: &str) -> Result<(), MailError>;
}

/// SMTP-backed [`Mailer`].
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay cannot be configured.
    pub fn new(config: &MailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_owned(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &Email, subject: &str, html_body: &str) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| MailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .as_str()
                .parse()
                .map_err(|_| MailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_owned())?;

        self.transport.send(message).await?;

        tracing::info!(to = %to, subject = %subject, "email sent");
        Ok(())
    }
}

/// Wrap a message body in the storefront's email chrome.
#[must_use]
pub fn nice_email(body: &str) -> String {
    format!(
        "<div style=\"border: 1px solid black; padding: 20px; \
         font-family: sans-serif; line-height: 2; font-size: 20px;\">\
         <h2>Hello There!</h2>\
         <p>{body}</p>\
         <p>- Thimble Goods</p>\
         </div>"
    )
}
