//! In-memory mock backend for local development and tests.
//!
//! Tracks initiated multipart uploads and completed objects so that the
//! upload/complete/download/delete flow behaves like the real store,
//! without any network access.

use crate::keys::object_key;
use crate::traits::{
    part_count, MultipartUpload, ObjectStore, StorageError, StorageResult, UploadedPart, PART_SIZE,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct PendingUpload {
    key: String,
    part_count: u64,
}

#[derive(Debug, Clone)]
struct StoredObject {
    size_hint: u64,
    content_type: String,
}

#[derive(Default)]
struct MockState {
    uploads: HashMap<String, PendingUpload>,
    objects: HashMap<String, StoredObject>,
}

/// Mock object store: objects live in a process-local map.
#[derive(Default)]
pub struct MockStore {
    state: RwLock<MockState>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored (completed) objects, for tests and health output.
    pub async fn object_count(&self) -> usize {
        self.state.read().await.objects.len()
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn create_multipart_upload(
        &self,
        file_name: &str,
        file_size: u64,
        content_type: &str,
    ) -> StorageResult<MultipartUpload> {
        let key = object_key(file_name);
        let upload_id = Uuid::new_v4().to_string();
        let parts = part_count(file_size);

        let part_urls = (1..=parts)
            .map(|n| format!("mock://upload/{}?partNumber={}&uploadId={}", key, n, upload_id))
            .collect();

        let mut state = self.state.write().await;
        state.uploads.insert(
            upload_id.clone(),
            PendingUpload {
                key: key.clone(),
                part_count: parts,
            },
        );
        // Size and content type are remembered at initiation; the mock has
        // no bytes to measure at completion.
        state.objects.insert(
            key.clone(),
            StoredObject {
                size_hint: file_size,
                content_type: content_type.to_string(),
            },
        );

        tracing::debug!(key = %key, parts, "Mock multipart upload initiated");

        Ok(MultipartUpload {
            upload_id,
            key,
            part_urls,
            part_size: PART_SIZE,
        })
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[UploadedPart],
    ) -> StorageResult<()> {
        let mut state = self.state.write().await;

        let pending = state
            .uploads
            .get(upload_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("upload {}", upload_id)))?;

        if pending.key != key {
            return Err(StorageError::CompleteFailed(format!(
                "key mismatch: upload {} was initiated for {}",
                upload_id, pending.key
            )));
        }

        if parts.len() as u64 != pending.part_count {
            return Err(StorageError::CompleteFailed(format!(
                "expected {} parts, got {}",
                pending.part_count,
                parts.len()
            )));
        }

        let mut seen = vec![false; parts.len()];
        for part in parts {
            if part.etag.is_empty() {
                return Err(StorageError::CompleteFailed(format!(
                    "part {} has an empty ETag",
                    part.part_number
                )));
            }
            let index = part.part_number as i64 - 1;
            if index < 0 || index as usize >= seen.len() || seen[index as usize] {
                return Err(StorageError::CompleteFailed(format!(
                    "invalid or duplicate part number {}",
                    part.part_number
                )));
            }
            seen[index as usize] = true;
        }

        state.uploads.remove(upload_id);
        tracing::debug!(key = %key, "Mock multipart upload completed");
        Ok(())
    }

    async fn download_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let state = self.state.read().await;
        let object = state
            .objects
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(format!(
            "mock://download/{}?expires={}&contentType={}&size={}",
            key,
            expires_in.as_secs(),
            object.content_type,
            object.size_hint
        ))
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        // Deleting a missing object is a no-op, matching S3 semantics.
        self.state.write().await.objects.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.state.read().await.objects.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn multipart_flow_round_trips() {
        let store = MockStore::new();

        // 25 MiB -> 3 parts of 10 MiB
        let upload = store
            .create_multipart_upload("video.mp4", 25 * 1024 * 1024, "video/mp4")
            .await
            .expect("initiate");
        assert_eq!(upload.part_urls.len(), 3);
        assert_eq!(upload.part_size, PART_SIZE);

        let parts: Vec<UploadedPart> = (1..=3)
            .map(|n| UploadedPart {
                part_number: n,
                etag: format!("etag-{}", n),
            })
            .collect();
        store
            .complete_multipart_upload(&upload.key, &upload.upload_id, &parts)
            .await
            .expect("complete");

        assert!(store.exists(&upload.key).await.expect("exists"));
        let url = store
            .download_url(&upload.key, Duration::from_secs(3600))
            .await
            .expect("download url");
        assert!(url.contains(&upload.key));
        assert!(url.contains("expires=3600"));
    }

    #[tokio::test]
    async fn completion_rejects_missing_parts() {
        let store = MockStore::new();
        let upload = store
            .create_multipart_upload("big.bin", 25 * 1024 * 1024, "application/octet-stream")
            .await
            .expect("initiate");

        let short = vec![UploadedPart {
            part_number: 1,
            etag: "etag-1".to_string(),
        }];
        let err = store
            .complete_multipart_upload(&upload.key, &upload.upload_id, &short)
            .await
            .expect_err("must reject");
        assert!(matches!(err, StorageError::CompleteFailed(_)));
    }

    #[tokio::test]
    async fn completion_rejects_duplicate_part_numbers() {
        let store = MockStore::new();
        let upload = store
            .create_multipart_upload("big.bin", 15 * 1024 * 1024, "application/octet-stream")
            .await
            .expect("initiate");

        let dup = vec![
            UploadedPart {
                part_number: 1,
                etag: "a".to_string(),
            },
            UploadedPart {
                part_number: 1,
                etag: "b".to_string(),
            },
        ];
        assert!(store
            .complete_multipart_upload(&upload.key, &upload.upload_id, &dup)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn completion_of_unknown_upload_is_not_found() {
        let store = MockStore::new();
        let err = store
            .complete_multipart_upload("transfers/x.bin", "nope", &[])
            .await
            .expect_err("unknown upload");
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MockStore::new();
        let upload = store
            .create_multipart_upload("a.txt", 10, "text/plain")
            .await
            .expect("initiate");

        store.delete_object(&upload.key).await.expect("first delete");
        store
            .delete_object(&upload.key)
            .await
            .expect("second delete is a no-op");
        assert!(!store.exists(&upload.key).await.expect("exists"));
    }
}
