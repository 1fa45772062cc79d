//! Storage abstraction trait
//!
//! Both backends (S3 and the in-memory mock) implement [`ObjectStore`], so
//! the rest of the application never branches on which one is configured.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Fixed multipart part size: 10 MiB.
pub const PART_SIZE: u64 = 10 * 1024 * 1024;

/// Number of parts a file of `file_size` bytes splits into.
pub fn part_count(file_size: u64) -> u64 {
    file_size.div_ceil(PART_SIZE).max(1)
}

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Multipart initiation failed: {0}")]
    InitFailed(String),

    #[error("Multipart completion failed: {0}")]
    CompleteFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// An initiated multipart upload: the caller PUTs each part directly to its
/// presigned URL, then finalizes via `complete_multipart_upload`.
#[derive(Debug, Clone)]
pub struct MultipartUpload {
    pub upload_id: String,
    pub key: String,
    /// One presigned PUT URL per part, in part order (part 1 first)
    pub part_urls: Vec<String>,
    pub part_size: u64,
}

/// A part the client finished uploading, as reported back by the store.
#[derive(Debug, Clone)]
pub struct UploadedPart {
    pub part_number: i32,
    pub etag: String,
}

/// Capability interface over the remote object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Initiate a multipart upload and presign one PUT URL per part.
    async fn create_multipart_upload(
        &self,
        file_name: &str,
        file_size: u64,
        content_type: &str,
    ) -> StorageResult<MultipartUpload>;

    /// Finalize a multipart upload. Fails if a part is missing or an ETag
    /// doesn't match what the store recorded.
    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[UploadedPart],
    ) -> StorageResult<()>;

    /// Time-limited presigned GET for direct client download.
    async fn download_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Delete a single object. Deleting a missing object is not an error.
    async fn delete_object(&self, key: &str) -> StorageResult<()>;

    /// Best-effort batch delete: every key is attempted independently and
    /// failures are logged, never propagated. Returns the keys that failed
    /// so callers can report or retry them.
    async fn delete_objects(&self, keys: &[String]) -> Vec<String> {
        let mut failed = Vec::new();
        for key in keys {
            if let Err(e) = self.delete_object(key).await {
                tracing::error!(error = %e, key = %key, "Failed to delete object, continuing");
                failed.push(key.clone());
            }
        }
        failed
    }

    /// Whether an object exists (used by upload completion and health checks).
    async fn exists(&self, key: &str) -> StorageResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_count_rounds_up() {
        assert_eq!(part_count(1), 1);
        assert_eq!(part_count(PART_SIZE), 1);
        assert_eq!(part_count(PART_SIZE + 1), 2);
        assert_eq!(part_count(25 * 1024 * 1024), 3);
    }

    #[test]
    fn empty_file_still_gets_one_part() {
        assert_eq!(part_count(0), 1);
    }

    /// A store whose deletes always fail, to exercise the best-effort
    /// batch default.
    struct FailingStore;

    #[async_trait]
    impl ObjectStore for FailingStore {
        async fn create_multipart_upload(
            &self,
            _file_name: &str,
            _file_size: u64,
            _content_type: &str,
        ) -> StorageResult<MultipartUpload> {
            unimplemented!()
        }

        async fn complete_multipart_upload(
            &self,
            _key: &str,
            _upload_id: &str,
            _parts: &[UploadedPart],
        ) -> StorageResult<()> {
            unimplemented!()
        }

        async fn download_url(&self, _key: &str, _expires_in: Duration) -> StorageResult<String> {
            unimplemented!()
        }

        async fn delete_object(&self, key: &str) -> StorageResult<()> {
            Err(StorageError::DeleteFailed(key.to_string()))
        }

        async fn exists(&self, _key: &str) -> StorageResult<bool> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn batch_delete_reports_every_failure_without_aborting() {
        let store = FailingStore;
        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let failed = store.delete_objects(&keys).await;
        assert_eq!(failed, keys);
    }
}
