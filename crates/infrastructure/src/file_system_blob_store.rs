//! Directory-backed blob store with atomic replacement.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use credwatch_application::BlobStore;
use credwatch_core::{AppError, AppResult};
use tracing::debug;

/// Blob store keeping one file per blob inside a single directory.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so readers never observe a partially written blob.
#[derive(Debug, Clone)]
pub struct FileSystemBlobStore {
    root: PathBuf,
}

impl FileSystemBlobStore {
    /// Opens the store rooted at `root`, creating the directory when missing.
    pub fn open(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|error| {
            AppError::Internal(format!(
                "failed to create blob directory '{}': {error}",
                root.display()
            ))
        })?;

        Ok(Self { root })
    }

    /// Returns the backing directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn blob_path(&self, name: &str) -> AppResult<PathBuf> {
        validate_blob_name(name)?;
        Ok(self.root.join(name))
    }
}

fn validate_blob_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(AppError::Validation(format!(
            "blob name '{name}' must be a plain file name"
        )));
    }

    Ok(())
}

async fn run_blocking<T, F>(operation: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|error| AppError::Internal(format!("blob store task failed: {error}")))?
}

#[async_trait]
impl BlobStore for FileSystemBlobStore {
    async fn put_blob(&self, name: &str, bytes: Vec<u8>) -> AppResult<()> {
        let path = self.blob_path(name)?;
        let root = self.root.clone();

        run_blocking(move || {
            let mut staged = tempfile::NamedTempFile::new_in(&root).map_err(|error| {
                AppError::Internal(format!(
                    "failed to stage blob in '{}': {error}",
                    root.display()
                ))
            })?;
            staged
                .write_all(bytes.as_slice())
                .and_then(|()| staged.as_file().sync_all())
                .map_err(|error| {
                    AppError::Internal(format!(
                        "failed to write staged blob for '{}': {error}",
                        path.display()
                    ))
                })?;
            staged.persist(&path).map_err(|error| {
                AppError::Internal(format!(
                    "failed to replace blob '{}': {error}",
                    path.display()
                ))
            })?;

            debug!(path = %path.display(), "blob replaced");
            Ok(())
        })
        .await
    }

    async fn get_blob(&self, name: &str) -> AppResult<Vec<u8>> {
        let path = self.blob_path(name)?;

        run_blocking(move || match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(error) if error.kind() == ErrorKind::NotFound => Err(AppError::NotFound(format!(
                "blob '{}' does not exist",
                path.display()
            ))),
            Err(error) => Err(AppError::Internal(format!(
                "failed to read blob '{}': {error}",
                path.display()
            ))),
        })
        .await
    }

    async fn list_blobs(&self, pattern: &str) -> AppResult<Vec<String>> {
        let matcher = glob::Pattern::new(pattern).map_err(|error| {
            AppError::Validation(format!("invalid blob pattern '{pattern}': {error}"))
        })?;
        let root = self.root.clone();

        run_blocking(move || {
            let entries = fs::read_dir(&root).map_err(|error| {
                AppError::Internal(format!(
                    "failed to list blob directory '{}': {error}",
                    root.display()
                ))
            })?;

            let mut names = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|error| {
                    AppError::Internal(format!("failed to read blob directory entry: {error}"))
                })?;
                let is_file = entry
                    .file_type()
                    .map(|file_type| file_type.is_file())
                    .unwrap_or(false);
                if !is_file {
                    continue;
                }

                if let Some(name) = entry.file_name().to_str()
                    && matcher.matches(name)
                {
                    names.push(name.to_owned());
                }
            }

            names.sort();
            Ok(names)
        })
        .await
    }

    async fn delete_blob(&self, name: &str) -> AppResult<()> {
        let path = self.blob_path(name)?;

        run_blocking(move || match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AppError::Internal(format!(
                "failed to delete blob '{}': {error}",
                path.display()
            ))),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use credwatch_application::BlobStore;
    use credwatch_core::AppError;

    use super::FileSystemBlobStore;

    fn store() -> (tempfile::TempDir, FileSystemBlobStore) {
        let directory = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        let store = FileSystemBlobStore::open(directory.path().join("snapshots"))
            .unwrap_or_else(|_| unreachable!());
        (directory, store)
    }

    #[tokio::test]
    async fn put_then_get_returns_bytes() {
        let (_directory, store) = store();

        assert!(store.put_blob("report.csv", b"first".to_vec()).await.is_ok());
        assert!(store.put_blob("report.csv", b"second".to_vec()).await.is_ok());

        let bytes = store
            .get_blob("report.csv")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(bytes, b"second");
    }

    #[tokio::test]
    async fn missing_blob_is_not_found() {
        let (_directory, store) = store();
        let result = store.get_blob("report.csv").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_matches_pattern_and_sorts() {
        let (_directory, store) = store();
        for name in ["report-b.csv", "report.csv", "report-a.csv", "other.csv"] {
            assert!(store.put_blob(name, Vec::new()).await.is_ok());
        }

        let names = store
            .list_blobs("report*.csv")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(names, ["report-a.csv", "report-b.csv", "report.csv"]);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_directory, store) = store();
        assert!(store.put_blob("report.csv", Vec::new()).await.is_ok());

        assert!(store.delete_blob("report.csv").await.is_ok());
        assert!(store.delete_blob("report.csv").await.is_ok());
        assert!(
            store
                .list_blobs("*")
                .await
                .unwrap_or_else(|_| unreachable!())
                .is_empty()
        );
    }

    #[tokio::test]
    async fn path_like_names_are_rejected() {
        let (_directory, store) = store();
        let result = store.put_blob("../escape.csv", Vec::new()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
