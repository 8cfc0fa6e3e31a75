//! Outbound SMTP delivery.
//!
//! One call to [`MailTransport::deliver`] is one SMTP session: connect,
//! authenticate, send, quit. Nothing is pooled or retried.

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::smtp_config::db_smtp_config::SmtpConfiguration;

/// Implicit-TLS submission port.
pub const SMTPS_PORT: u16 = 465;

/// Delivery failures. The display text is what the caller and the history see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Invalid sender address: {0}")]
    InvalidSender(String),

    /// The message could not be assembled.
    #[error("{0}")]
    Message(String),

    /// TLS or relay setup failed before connecting.
    #[error("{0}")]
    Setup(String),

    /// Connect, authentication or transmission failed.
    #[error("{0}")]
    Send(String),
}

/// A fully addressed message ready for the wire.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub from: Mailbox,
    pub to: Vec<Address>,
    pub cc: Vec<Address>,
    pub bcc: Vec<Address>,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
}

impl OutgoingMessage {
    pub fn recipient_count(&self) -> usize {
        self.to.len() + self.cc.len() + self.bcc.len()
    }

    /// Build the RFC 5322 message. Bcc stays in the envelope only.
    pub fn to_lettre(&self) -> Result<Message, TransportError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(self.subject.clone());
        for addr in &self.to {
            builder = builder.to(Mailbox::new(None, addr.clone()));
        }
        for addr in &self.cc {
            builder = builder.cc(Mailbox::new(None, addr.clone()));
        }
        for addr in &self.bcc {
            builder = builder.bcc(Mailbox::new(None, addr.clone()));
        }
        let content_type = if self.is_html {
            ContentType::TEXT_HTML
        } else {
            ContentType::TEXT_PLAIN
        };
        builder
            .header(content_type)
            .body(self.body.clone())
            .map_err(|e| TransportError::Message(e.to_string()))
    }
}

/// Delivers one message through one SMTP configuration.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(
        &self,
        config: &SmtpConfiguration,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError>;
}

/// `lettre`-backed transport; builds a fresh connection for every delivery.
#[derive(Debug, Clone)]
pub struct LettreTransport {
    timeout: Duration,
}

impl LettreTransport {
    pub fn new(timeout: Duration) -> Self {
        LettreTransport { timeout }
    }

    fn mailer(
        &self,
        config: &SmtpConfiguration,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, TransportError> {
        let setup = |e: lettre::transport::smtp::Error| TransportError::Setup(e.to_string());
        let builder = match (config.use_tls, config.port) {
            (true, SMTPS_PORT) => {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host).map_err(setup)?
            }
            (true, _) => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host).map_err(setup)?
            }
            (false, _) => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };
        let mut builder = builder.port(config.port).timeout(Some(self.timeout));
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl MailTransport for LettreTransport {
    async fn deliver(
        &self,
        config: &SmtpConfiguration,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError> {
        let email = message.to_lettre()?;
        let mailer = self.mailer(config)?;
        debug!(host = %config.host, port = config.port, tls = config.use_tls, "opening smtp session");
        let response = mailer
            .send(email)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        info!(
            host = %config.host,
            recipients = message.recipient_count(),
            code = %response.code(),
            "message accepted by smtp server"
        );
        Ok(())
    }
}
