use async_trait::async_trait;
use credwatch_core::AppResult;

/// One HTML message addressed to one or more recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    /// Sender mailbox address.
    pub from_address: String,
    /// Sender display name.
    pub from_name: String,
    /// Recipient addresses; all of them receive the same message.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Self-contained HTML body.
    pub html_body: String,
}

/// Port for sending emails. Infrastructure provides SMTP or console implementations.
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Sends one message to all of its recipients.
    async fn send_email(&self, email: &OutboundEmail) -> AppResult<()>;
}
