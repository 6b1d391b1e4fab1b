//! Owner-addressed alert dispatch.
//!
//! One message per alert event. All owners of a credential share that one
//! message, and two credentials never share a message.

use std::sync::Arc;

use credwatch_core::AppResult;
use credwatch_domain::AlertEvent;
use futures::StreamExt;
use tracing::{info, warn};

use crate::{EmailService, OutboundEmail};

use self::template::AlertTemplates;

mod template;

#[cfg(test)]
mod tests;

/// Sender identity used on every alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    /// Sender mailbox address.
    pub address: String,
    /// Sender display name.
    pub name: String,
}

/// What happened to one alert event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// A message went out to this many recipients.
    Sent {
        /// Number of recipients on the message.
        recipients: usize,
    },
    /// No deliverable owner address; nothing was sent.
    Skipped,
}

/// Counters for one bulk dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Messages sent.
    pub sent: usize,
    /// Events skipped for lack of recipients.
    pub skipped: usize,
    /// Events whose send failed.
    pub failed: usize,
}

/// Renders and sends alert messages.
#[derive(Clone)]
pub struct Notifier {
    email_service: Arc<dyn EmailService>,
    sender: SenderIdentity,
    templates: Arc<AlertTemplates>,
    concurrency: usize,
}

impl Notifier {
    /// Creates a notifier dispatching one event at a time.
    ///
    /// Fails with `Internal` when the alert templates cannot be registered.
    pub fn new(email_service: Arc<dyn EmailService>, sender: SenderIdentity) -> AppResult<Self> {
        Ok(Self {
            email_service,
            sender,
            templates: Arc::new(AlertTemplates::new()?),
            concurrency: 1,
        })
    }

    /// Sets how many events are dispatched concurrently.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Builds the message for `event`, or `None` when it has no recipients.
    pub fn compose(&self, event: &AlertEvent) -> AppResult<Option<OutboundEmail>> {
        let recipients: Vec<String> = event
            .record()
            .owner_emails()
            .iter()
            .map(|email| email.trim())
            .filter(|email| !email.is_empty())
            .map(str::to_owned)
            .collect();
        if recipients.is_empty() {
            return Ok(None);
        }

        Ok(Some(OutboundEmail {
            from_address: self.sender.address.clone(),
            from_name: self.sender.name.clone(),
            to: recipients,
            subject: template::render_subject(event),
            html_body: self.templates.render_html(event)?,
        }))
    }

    /// Sends the alert for one event.
    pub async fn notify(&self, event: &AlertEvent) -> AppResult<NotificationOutcome> {
        let Some(email) = self.compose(event)? else {
            warn!(
                application = %event.record().application_name(),
                kind = %event.record().kind(),
                days_left = event.days_left(),
                "no deliverable owner address, skipping alert"
            );
            return Ok(NotificationOutcome::Skipped);
        };

        self.email_service.send_email(&email).await?;
        info!(
            application = %event.record().application_name(),
            kind = %event.record().kind(),
            days_left = event.days_left(),
            recipients = email.to.len(),
            "expiry alert sent"
        );

        Ok(NotificationOutcome::Sent {
            recipients: email.to.len(),
        })
    }

    /// Sends alerts for every event. A failed event is logged and counted;
    /// it never stops the remaining events.
    pub async fn notify_all(
        &self,
        events: impl IntoIterator<Item = AlertEvent>,
    ) -> DispatchSummary {
        futures::stream::iter(events)
            .map(|event| async move {
                let outcome = self.notify(&event).await;
                (event, outcome)
            })
            .buffer_unordered(self.concurrency)
            .fold(DispatchSummary::default(), |mut summary, (event, outcome)| async move {
                match outcome {
                    Ok(NotificationOutcome::Sent { .. }) => summary.sent += 1,
                    Ok(NotificationOutcome::Skipped) => summary.skipped += 1,
                    Err(error) => {
                        summary.failed += 1;
                        warn!(
                            application = %event.record().application_name(),
                            kind = %event.record().kind(),
                            days_left = event.days_left(),
                            error = %error,
                            "failed to send expiry alert"
                        );
                    }
                }
                summary
            })
            .await
    }
}
