//! Application services and ports.

#![forbid(unsafe_code)]

mod credential_collector;
mod credential_monitor_service;
mod expiry_evaluator;
mod monitor_config;
mod monitor_ports;
mod notifier;
mod retrying_client;
mod snapshot_store;

#[cfg(test)]
mod test_fakes;

pub use credential_collector::{CollectionOutcome, CredentialCollector, SkippedApplication};
pub use credential_monitor_service::{CredentialMonitorService, MonitorRunSummary};
pub use expiry_evaluator::{ExpiryEvaluator, evaluate_expiry};
pub use monitor_config::MonitorConfig;
pub use monitor_ports::{BlobStore, DirectoryClient, EmailService, OutboundEmail};
pub use notifier::{DispatchSummary, NotificationOutcome, Notifier, SenderIdentity};
pub use retrying_client::{RetryPolicy, RetryingClient};
pub use snapshot_store::{REPORT_HEADERS, SnapshotStore};
