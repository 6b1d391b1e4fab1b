use std::collections::BTreeMap;

use async_trait::async_trait;
use credwatch_application::BlobStore;
use credwatch_core::{AppError, AppResult};
use tokio::sync::RwLock;

/// In-memory blob store, used as the staging area when no staging directory is configured.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Creates an empty in-memory blob store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put_blob(&self, name: &str, bytes: Vec<u8>) -> AppResult<()> {
        self.blobs.write().await.insert(name.to_owned(), bytes);
        Ok(())
    }

    async fn get_blob(&self, name: &str) -> AppResult<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("blob '{name}' does not exist")))
    }

    async fn list_blobs(&self, pattern: &str) -> AppResult<Vec<String>> {
        let matcher = glob::Pattern::new(pattern).map_err(|error| {
            AppError::Validation(format!("invalid blob pattern '{pattern}': {error}"))
        })?;

        Ok(self
            .blobs
            .read()
            .await
            .keys()
            .filter(|name| matcher.matches(name))
            .cloned()
            .collect())
    }

    async fn delete_blob(&self, name: &str) -> AppResult<()> {
        self.blobs.write().await.remove(name);
        Ok(())
    }
}
