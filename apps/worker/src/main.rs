//! Credential expiry monitoring worker.
//!
//! `credwatch-worker [run]` collects credentials, replaces the snapshot and
//! alerts owners. `credwatch-worker alerts` only re-evaluates the last
//! persisted snapshot.

#![forbid(unsafe_code)]

mod worker_config;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use credwatch_application::{
    BlobStore, CredentialCollector, CredentialMonitorService, EmailService, ExpiryEvaluator,
    Notifier, RetryingClient, SnapshotStore,
};
use credwatch_core::{AppError, AppResult, RunId};
use credwatch_domain::{MailboxPrefixNormalizer, OwnerEmailNormalizer, VerbatimEmailNormalizer};
use credwatch_infrastructure::{
    ConsoleEmailService, FileSystemBlobStore, GraphDirectoryClient, InMemoryBlobStore,
    SmtpEmailService,
};
use tracing::{error, info};

use crate::worker_config::{
    EmailProviderConfig, OwnerEmailNormalization, RunMode, WorkerConfig, init_tracing,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let mode = RunMode::from_arg(env::args().nth(1).as_deref())?;
    let config = WorkerConfig::load()?;
    let service = build_monitor_service(&config)?;
    let run_id = RunId::new();

    info!(
        run_id = %run_id,
        mode = mode.as_str(),
        snapshot = %config.snapshot_name,
        store_dir = %config.snapshot_store_dir.display(),
        "credwatch-worker started"
    );

    let result = match mode {
        RunMode::Full => service.run(run_id, Utc::now()).await,
        RunMode::AlertsOnly => service.run_alerts_only(run_id, Utc::now()).await,
    };

    match result {
        Ok(summary) => {
            info!(
                run_id = %run_id,
                alerts_raised = summary.alerts_raised,
                notifications_failed = summary.notifications.failed,
                "credwatch-worker finished"
            );
            Ok(())
        }
        Err(run_error) => {
            error!(run_id = %run_id, error = %run_error, "credwatch-worker failed");
            Err(run_error)
        }
    }
}

fn build_monitor_service(config: &WorkerConfig) -> AppResult<CredentialMonitorService> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let directory = Arc::new(GraphDirectoryClient::new(
        http_client,
        config.graph_base_url.as_str(),
        config.graph_access_token.as_str(),
    ));

    let email_normalizer: Arc<dyn OwnerEmailNormalizer> = match config.owner_email_normalization
    {
        OwnerEmailNormalization::MailboxPrefix => Arc::new(MailboxPrefixNormalizer),
        OwnerEmailNormalization::Verbatim => Arc::new(VerbatimEmailNormalizer),
    };

    let retrying_client = RetryingClient::new(config.monitor.retry_policy()?);
    let collector = CredentialCollector::new(
        directory,
        retrying_client,
        email_normalizer,
        config.snapshot_name.clone(),
    )
    .with_concurrency(config.monitor.collector_concurrency);

    let durable = Arc::new(FileSystemBlobStore::open(config.snapshot_store_dir.clone())?);
    let staging: Arc<dyn BlobStore> = match &config.snapshot_staging_dir {
        Some(directory) => Arc::new(FileSystemBlobStore::open(directory.clone())?),
        None => Arc::new(InMemoryBlobStore::new()),
    };
    let store = SnapshotStore::new(durable, config.snapshot_name.clone()).with_staging(staging);

    let notifier = Notifier::new(build_email_service(config), config.sender.clone())?
        .with_concurrency(config.monitor.notifier_concurrency);

    Ok(CredentialMonitorService::new(
        collector,
        store,
        ExpiryEvaluator::new(config.monitor.alert_days.clone()),
        notifier,
    ))
}

fn build_email_service(config: &WorkerConfig) -> Arc<dyn EmailService> {
    match &config.email_provider {
        EmailProviderConfig::Console => Arc::new(ConsoleEmailService::new()),
        EmailProviderConfig::Smtp(smtp) => Arc::new(SmtpEmailService::new(smtp.clone())),
    }
}
