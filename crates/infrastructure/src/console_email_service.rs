//! Console email service for development. Logs emails to tracing output.

use async_trait::async_trait;
use credwatch_application::{EmailService, OutboundEmail};
use credwatch_core::AppResult;
use tracing::info;

/// Development email service that logs emails to the console.
#[derive(Clone)]
pub struct ConsoleEmailService;

impl ConsoleEmailService {
    /// Creates a new console email service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleEmailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send_email(&self, email: &OutboundEmail) -> AppResult<()> {
        let recipients = email.to.join(", ");
        info!(
            to = %recipients,
            subject = %email.subject,
            "--- EMAIL (console) ---\nFrom: {} <{}>\nTo: {}\nSubject: {}\n\n{}\n--- END EMAIL ---",
            email.from_name,
            email.from_address,
            recipients,
            email.subject,
            email.html_body
        );

        Ok(())
    }
}
