//! SMTP email service using the `lettre` crate.

use async_trait::async_trait;
use credwatch_application::{EmailService, OutboundEmail};
use credwatch_core::{AppError, AppResult};
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MessageBuilder};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// SMTP email service configuration.
#[derive(Clone)]
pub struct SmtpEmailConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username.
    pub username: String,
    /// SMTP password.
    pub password: String,
}

/// Production email service using SMTP.
#[derive(Clone)]
pub struct SmtpEmailService {
    config: SmtpEmailConfig,
}

impl SmtpEmailService {
    /// Creates a new SMTP email service.
    #[must_use]
    pub fn new(config: SmtpEmailConfig) -> Self {
        Self { config }
    }
}

fn build_message(email: &OutboundEmail) -> AppResult<Message> {
    let from_address = email
        .from_address
        .parse()
        .map_err(|error| AppError::Validation(format!("invalid from address: {error}")))?;
    let from_name = (!email.from_name.trim().is_empty()).then(|| email.from_name.clone());

    let mut builder: MessageBuilder = Message::builder()
        .from(Mailbox::new(from_name, from_address))
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_HTML);

    for recipient in &email.to {
        let mailbox: Mailbox = recipient.parse().map_err(|error| {
            AppError::Validation(format!("invalid recipient address '{recipient}': {error}"))
        })?;
        builder = builder.to(mailbox);
    }

    builder
        .body(email.html_body.clone())
        .map_err(|error| AppError::Internal(format!("failed to build email: {error}")))
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_email(&self, email: &OutboundEmail) -> AppResult<()> {
        let message = build_message(email)?;

        let credentials =
            Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
            .map_err(|error| {
                AppError::Internal(format!("failed to create SMTP transport: {error}"))
            })?
            .port(self.config.port)
            .credentials(credentials)
            .build();

        mailer
            .send(message)
            .await
            .map_err(|error| AppError::Remote(format!("failed to send email: {error}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use credwatch_application::OutboundEmail;
    use credwatch_core::AppError;

    use super::build_message;

    fn email(to: &[&str]) -> OutboundEmail {
        OutboundEmail {
            from_address: "alerts@example.com".to_owned(),
            from_name: "Credential Expiry Monitor".to_owned(),
            to: to.iter().map(|address| (*address).to_owned()).collect(),
            subject: "Secret for Payroll expires in 7 days".to_owned(),
            html_body: "<p>rotate</p>".to_owned(),
        }
    }

    #[test]
    fn message_lists_every_recipient() {
        let message =
            build_message(&email(&["a@x.com", "b@x.com"])).unwrap_or_else(|_| unreachable!());
        let formatted = String::from_utf8(message.formatted()).unwrap_or_else(|_| unreachable!());

        assert!(formatted.contains("a@x.com"));
        assert!(formatted.contains("b@x.com"));
        assert!(formatted.contains("Credential Expiry Monitor"));
        assert!(formatted.contains("text/html"));
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let result = build_message(&email(&["not an address"]));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
