//! Directory collection into flat credential records.

use std::sync::Arc;

use credwatch_core::{AppError, AppResult};
use credwatch_domain::{
    Application, CredentialRecord, OwnerEmailNormalizer, Snapshot, SnapshotName,
};
use futures::StreamExt;
use tracing::{info, warn};

use crate::{DirectoryClient, RetryingClient};


/// Application left out of a snapshot because collecting it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedApplication {
    /// Display name of the skipped application.
    pub application_name: String,
    /// Error that caused the skip.
    pub reason: String,
}

/// Result of one collection pass.
#[derive(Debug, Clone)]
pub struct CollectionOutcome {
    /// Records of every application collected successfully.
    pub snapshot: Snapshot,
    /// Number of applications the directory listed.
    pub applications_listed: usize,
    /// Applications that failed and were skipped, in listing order.
    pub skipped: Vec<SkippedApplication>,
}

/// Collects applications, credentials and owners into a snapshot.
#[derive(Clone)]
pub struct CredentialCollector {
    directory: Arc<dyn DirectoryClient>,
    retrying_client: RetryingClient,
    email_normalizer: Arc<dyn OwnerEmailNormalizer>,
    snapshot_name: SnapshotName,
    concurrency: usize,
}

impl CredentialCollector {
    /// Creates a collector.
    #[must_use]
    pub fn new(
        directory: Arc<dyn DirectoryClient>,
        retrying_client: RetryingClient,
        email_normalizer: Arc<dyn OwnerEmailNormalizer>,
        snapshot_name: SnapshotName,
    ) -> Self {
        Self {
            directory,
            retrying_client,
            email_normalizer,
            snapshot_name,
            concurrency: 1,
        }
    }

    /// Sets how many applications are processed concurrently.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Collects every listed application into one snapshot.
    ///
    /// A failure to list applications aborts the pass. Failures of single
    /// applications are logged and skipped, unless every listed application
    /// fails, which is treated as a total collection failure.
    pub async fn collect(&self) -> AppResult<CollectionOutcome> {
        let applications = self
            .retrying_client
            .execute("list applications", || self.directory.list_applications())
            .await?;
        let applications_listed = applications.len();

        // `buffered` yields in input order, so records keep listing order.
        let outcomes: Vec<(Application, AppResult<Vec<CredentialRecord>>)> =
            futures::stream::iter(applications)
                .map(|application| async move {
                    let outcome = self.collect_application(&application).await;
                    (application, outcome)
                })
                .buffered(self.concurrency)
                .collect()
                .await;

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for (application, outcome) in outcomes {
            match outcome {
                Ok(application_records) => records.extend(application_records),
                Err(error) => {
                    warn!(
                        application_id = %application.id(),
                        application = %application.display_name(),
                        error = %error,
                        "skipping application after collection failure"
                    );
                    skipped.push(SkippedApplication {
                        application_name: application.display_name().to_owned(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        if applications_listed > 0 && skipped.len() == applications_listed {
            return Err(AppError::Remote(format!(
                "all {applications_listed} listed applications failed to collect"
            )));
        }

        info!(
            applications_listed,
            applications_skipped = skipped.len(),
            records = records.len(),
            "credential collection finished"
        );

        Ok(CollectionOutcome {
            snapshot: Snapshot::new(self.snapshot_name.clone(), records),
            applications_listed,
            skipped,
        })
    }

    /// Collects the records of a single application.
    ///
    /// This is the per-item isolation boundary: the caller decides whether an
    /// error skips the application or aborts anything.
    pub async fn collect_application(
        &self,
        application: &Application,
    ) -> AppResult<Vec<CredentialRecord>> {
        let application_id = application.id();
        let (credentials, owners) = futures::future::try_join(
            self.retrying_client
                .execute("get application credentials", || {
                    self.directory.get_application_credentials(application_id)
                }),
            self.retrying_client.execute("list application owners", || {
                self.directory.list_owners(application_id)
            }),
        )
        .await?;

        let owner_names: Vec<String> = owners
            .iter()
            .map(|owner| owner.display_name().to_owned())
            .collect();
        let owner_emails: Vec<String> = owners
            .iter()
            .filter_map(|owner| owner.email())
            .filter_map(|email| self.email_normalizer.normalize(email))
            .collect();

        Ok(credentials
            .iter()
            .map(|credential| {
                CredentialRecord::new(
                    application.display_name(),
                    credential.end_time().date_naive(),
                    credential.kind(),
                    owner_names.clone(),
                    owner_emails.clone(),
                )
            })
            .collect())
    }
}
