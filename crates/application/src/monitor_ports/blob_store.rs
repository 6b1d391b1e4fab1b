use async_trait::async_trait;
use credwatch_core::AppResult;

/// Port for named blob storage.
///
/// `put_blob` must replace existing content atomically: a concurrent reader
/// sees either the previous blob or the new one, never a partial write.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `name`, replacing any previous blob.
    async fn put_blob(&self, name: &str, bytes: Vec<u8>) -> AppResult<()>;

    /// Returns the blob stored under `name`, or `AppError::NotFound`.
    async fn get_blob(&self, name: &str) -> AppResult<Vec<u8>>;

    /// Lists blob names matching a glob pattern (`*` and `?` wildcards), sorted.
    async fn list_blobs(&self, pattern: &str) -> AppResult<Vec<String>>;

    /// Deletes the blob stored under `name`. Deleting a missing blob succeeds.
    async fn delete_blob(&self, name: &str) -> AppResult<()>;
}
