//! Outbound HTML email over authenticated SMTP.

use std::sync::Arc;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{error, info};

/// Subject line of one-time code emails.
pub const OTP_SUBJECT: &str = "Verification OTP.";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// SMTP relay client. Messages are sent from the authenticated account.
#[derive(Clone)]
pub struct Mailer {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl Mailer {
    /// Connect lazily to `host` over TLS with the given credentials.
    pub fn new(host: &str, user: &str, password: &str) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
            .credentials(Credentials::new(user.to_string(), password.to_string()))
            .build();

        Ok(Self {
            transport: Arc::new(transport),
            from: user.parse()?,
        })
    }

    /// Sender address.
    pub fn from(&self) -> &Mailbox {
        &self.from
    }

    /// Build an HTML message from the configured sender.
    pub fn compose(&self, to: &str, subject: &str, html: &str) -> Result<Message, MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())?;
        Ok(message)
    }

    /// Send and wait for the relay's answer.
    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let message = self.compose(to, subject, html)?;
        self.transport.send(message).await?;
        info!(to = to, subject = subject, "Email sent");
        Ok(())
    }

    /// Send in the background. The outcome is only logged.
    pub fn send_detached(&self, to: String, subject: String, html: String) {
        let mailer = self.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&to, &subject, &html).await {
                error!(to = %to, subject = %subject, error = %e, "Email delivery failed");
            }
        });
    }
}

/// Body of a one-time code email.
pub fn otp_email_html(code: &str, valid_minutes: u64) -> String {
    format!(
        "<p>Your verification code is <strong>{}</strong>.</p>\
         <p>It expires in {} minutes.</p>",
        code, valid_minutes
    )
}
