//! Durable snapshot persistence on top of the blob store port.

use std::sync::Arc;

use credwatch_core::{AppError, AppResult};
use credwatch_domain::{Snapshot, SnapshotName};
use tracing::{debug, info};

use crate::BlobStore;

mod report_format;


pub use report_format::REPORT_HEADERS;

/// Stores the latest snapshot under its logical name.
///
/// Each write fully supersedes the previous snapshot. The canonical blob is
/// replaced through the store's atomic `put_blob`, and other artifacts
/// matching the name pattern are pruned first so reruns never pile up files.
#[derive(Clone)]
pub struct SnapshotStore {
    durable: Arc<dyn BlobStore>,
    staging: Option<Arc<dyn BlobStore>>,
    name: SnapshotName,
}

impl SnapshotStore {
    /// Creates a store writing only to the durable blob store.
    #[must_use]
    pub fn new(durable: Arc<dyn BlobStore>, name: SnapshotName) -> Self {
        Self {
            durable,
            staging: None,
            name,
        }
    }

    /// Adds a local staging area that receives a copy before the durable write.
    #[must_use]
    pub fn with_staging(mut self, staging: Arc<dyn BlobStore>) -> Self {
        self.staging = Some(staging);
        self
    }

    /// Returns the logical snapshot name.
    #[must_use]
    pub fn name(&self) -> &SnapshotName {
        &self.name
    }

    /// Persists `snapshot`, replacing the previous one.
    pub async fn write(&self, snapshot: &Snapshot) -> AppResult<()> {
        if snapshot.name() != &self.name {
            return Err(AppError::Validation(format!(
                "snapshot '{}' cannot be written to store '{}'",
                snapshot.name(),
                self.name
            )));
        }

        let bytes = report_format::encode(snapshot.records())?;
        let blob_name = self.name.blob_name();

        if let Some(staging) = &self.staging {
            self.prune(staging.as_ref(), "staging").await?;
            staging.put_blob(blob_name.as_str(), bytes.clone()).await?;
        }

        self.prune(self.durable.as_ref(), "durable").await?;
        self.durable.put_blob(blob_name.as_str(), bytes).await?;

        info!(
            snapshot = %self.name,
            blob = %blob_name,
            records = snapshot.records().len(),
            "snapshot written"
        );

        Ok(())
    }

    /// Reads the latest persisted snapshot.
    ///
    /// Fails with `AppError::NotFound` when nothing was ever written.
    pub async fn read(&self) -> AppResult<Snapshot> {
        let blob_name = self.name.blob_name();
        let bytes = self
            .durable
            .get_blob(blob_name.as_str())
            .await
            .map_err(|error| match error {
                AppError::NotFound(_) => AppError::NotFound(format!(
                    "no snapshot has been written under '{}'",
                    self.name
                )),
                other => other,
            })?;

        let records = report_format::decode(bytes.as_slice())?;
        debug!(snapshot = %self.name, records = records.len(), "snapshot read");

        Ok(Snapshot::new(self.name.clone(), records))
    }

    async fn prune(&self, store: &dyn BlobStore, area: &str) -> AppResult<usize> {
        let blob_name = self.name.blob_name();
        let stale: Vec<String> = store
            .list_blobs(self.name.blob_pattern().as_str())
            .await?
            .into_iter()
            .filter(|name| *name != blob_name)
            .collect();

        for name in &stale {
            store.delete_blob(name.as_str()).await?;
            debug!(area = area, blob = %name, "pruned stale snapshot artifact");
        }

        Ok(stale.len())
    }
}
