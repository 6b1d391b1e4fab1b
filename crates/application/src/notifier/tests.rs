use std::sync::Arc;

use chrono::NaiveDate;
use credwatch_domain::{AlertEvent, CredentialKind, CredentialRecord};

use super::{DispatchSummary, NotificationOutcome, Notifier, SenderIdentity};
use crate::test_fakes::FakeEmailService;

fn sender() -> SenderIdentity {
    SenderIdentity {
        address: "alerts@example.com".to_owned(),
        name: "Credential Expiry Monitor".to_owned(),
    }
}

fn event(application: &str, kind: CredentialKind, emails: &[&str], days_left: i64) -> AlertEvent {
    AlertEvent::new(
        CredentialRecord::new(
            application,
            NaiveDate::from_ymd_opt(2025, 3, 8).unwrap_or_else(|| unreachable!()),
            kind,
            vec!["Alice".to_owned(), "Bob".to_owned()],
            emails.iter().map(|email| (*email).to_owned()),
        ),
        days_left,
    )
}

#[tokio::test]
async fn one_message_reaches_every_owner() {
    let email = Arc::new(FakeEmailService::default());
    let notifier = Notifier::new(email.clone(), sender()).unwrap_or_else(|_| unreachable!());

    let summary = notifier
        .notify_all(vec![event(
            "Payroll",
            CredentialKind::Secret,
            &["a@x.com", "b@x.com"],
            7,
        )])
        .await;

    assert_eq!(
        summary,
        DispatchSummary {
            sent: 1,
            skipped: 0,
            failed: 0
        }
    );
    let sent = email.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, ["a@x.com", "b@x.com"]);
    assert_eq!(sent[0].from_address, "alerts@example.com");
    assert_eq!(sent[0].from_name, "Credential Expiry Monitor");
    assert!(sent[0].html_body.contains("Payroll"));
}

#[tokio::test]
async fn event_without_recipients_is_skipped_not_failed() {
    let email = Arc::new(FakeEmailService::default());
    let notifier = Notifier::new(email.clone(), sender()).unwrap_or_else(|_| unreachable!());
    let event = event("Payroll", CredentialKind::Secret, &[], 7);

    let outcome = notifier.notify(&event).await;
    assert!(matches!(outcome, Ok(NotificationOutcome::Skipped)));

    let summary = notifier.notify_all(vec![event]).await;
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.failed, 0);
    assert!(email.sent().is_empty());
}

#[tokio::test]
async fn credentials_of_the_same_application_get_separate_messages() {
    let email = Arc::new(FakeEmailService::default());
    let notifier = Notifier::new(email.clone(), sender())
        .unwrap_or_else(|_| unreachable!())
        .with_concurrency(4);

    let summary = notifier
        .notify_all(vec![
            event("Payroll", CredentialKind::Secret, &["a@x.com"], 7),
            event("Payroll", CredentialKind::Certificate, &["a@x.com"], 30),
        ])
        .await;

    assert_eq!(summary.sent, 2);
    let mut subjects: Vec<String> = email.sent().into_iter().map(|sent| sent.subject).collect();
    subjects.sort();
    assert_eq!(
        subjects,
        [
            "Certificate for Payroll expires in 30 days",
            "Secret for Payroll expires in 7 days",
        ]
    );
}

#[tokio::test]
async fn send_failure_does_not_stop_other_events() {
    let email = Arc::new(FakeEmailService {
        fail_subjects_containing: Some("Billing".to_owned()),
        ..FakeEmailService::default()
    });
    let notifier = Notifier::new(email.clone(), sender())
        .unwrap_or_else(|_| unreachable!())
        .with_concurrency(2);

    let summary = notifier
        .notify_all(vec![
            event("Billing", CredentialKind::Secret, &["b@x.com"], 1),
            event("Payroll", CredentialKind::Secret, &["a@x.com"], 1),
            event("Orphan", CredentialKind::Secret, &[], 1),
        ])
        .await;

    assert_eq!(
        summary,
        DispatchSummary {
            sent: 1,
            skipped: 1,
            failed: 1
        }
    );
    assert_eq!(email.sent().len(), 1);
    assert_eq!(email.sent()[0].to, ["a@x.com"]);
}

#[test]
fn compose_returns_none_without_recipients() {
    let notifier = Notifier::new(Arc::new(FakeEmailService::default()), sender())
        .unwrap_or_else(|_| unreachable!());
    assert!(
        notifier
            .compose(&event("Payroll", CredentialKind::Secret, &[], 3))
            .unwrap_or_else(|_| unreachable!())
            .is_none()
    );
}
