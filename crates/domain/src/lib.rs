//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod alert;
mod credential_record;
mod directory;
mod owner_email;

pub use alert::{AlertDays, AlertEvent, DEFAULT_ALERT_DAYS, days_until};
pub use credential_record::{CredentialRecord, Snapshot, SnapshotName};
pub use directory::{Application, ApplicationId, Credential, CredentialKind, Owner};
pub use owner_email::{MailboxPrefixNormalizer, OwnerEmailNormalizer, VerbatimEmailNormalizer};
