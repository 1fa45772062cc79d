use crate::{MockStore, ObjectStore, S3Store, StorageError, StorageResult};
use droply_core::config::{Config, StorageBackend};
use std::sync::Arc;

/// Create the object-store backend selected by configuration. Called once
/// at startup; everything downstream sees only `Arc<dyn ObjectStore>`.
pub async fn create_store(config: &Config) -> StorageResult<Arc<dyn ObjectStore>> {
    match config.storage_backend {
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;

            let store = S3Store::new(bucket, region, config.s3_endpoint.clone()).await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Mock => {
            tracing::warn!("Using in-memory mock object store; uploads will not persist");
            Ok(Arc::new(MockStore::new()))
        }
    }
}
