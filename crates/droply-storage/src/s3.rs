use crate::keys::object_key;
use crate::traits::{
    part_count, MultipartUpload, ObjectStore, StorageError, StorageResult, UploadedPart, PART_SIZE,
};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use std::time::Duration;

/// How long each presigned part-upload URL stays valid.
const PART_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// S3 (and S3-compatible) storage implementation
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Create a new S3Store.
    ///
    /// # Arguments
    /// * `bucket` - bucket name
    /// * `region` - region identifier (any string for compatible providers)
    /// * `endpoint_url` - optional custom endpoint for S3-compatible
    ///   providers (e.g. "http://localhost:9000" for MinIO, a Backblaze B2
    ///   endpoint, DigitalOcean Spaces). Credentials come from the standard
    ///   AWS environment/profile chain.
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(endpoint) = endpoint_url {
            // Path-style addressing for compatibility with non-AWS providers
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(S3Store {
            client: Client::from_conf(builder.build()),
            bucket,
        })
    }

    fn presigning(expires_in: Duration) -> StorageResult<PresigningConfig> {
        PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn create_multipart_upload(
        &self,
        file_name: &str,
        file_size: u64,
        content_type: &str,
    ) -> StorageResult<MultipartUpload> {
        let key = object_key(file_name);
        let start = std::time::Instant::now();

        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    "S3 create_multipart_upload failed"
                );
                StorageError::InitFailed(e.to_string())
            })?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| {
                StorageError::InitFailed("store returned no upload id".to_string())
            })?
            .to_string();

        let parts = part_count(file_size);
        let mut part_urls = Vec::with_capacity(parts as usize);
        for part_number in 1..=parts {
            let presigned = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(&key)
                .upload_id(&upload_id)
                .part_number(part_number as i32)
                .presigned(Self::presigning(PART_URL_TTL)?)
                .await
                .map_err(|e| {
                    tracing::error!(
                        error = %e,
                        bucket = %self.bucket,
                        key = %key,
                        part_number,
                        "S3 part URL presigning failed"
                    );
                    StorageError::InitFailed(e.to_string())
                })?;
            part_urls.push(presigned.uri().to_string());
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = file_size,
            parts,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Multipart upload initiated"
        );

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
        let completed: Vec<CompletedPart> = parts
            .iter()
            .map(|p| {
                CompletedPart::builder()
                    .part_number(p.part_number)
                    .e_tag(&p.etag)
                    .build()
            })
            .collect();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    upload_id = %upload_id,
                    "S3 complete_multipart_upload failed"
                );
                StorageError::CompleteFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            parts = parts.len(),
            "Multipart upload completed"
        );

        Ok(())
    }

    async fn download_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(Self::presigning(expires_in)?)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    "S3 delete failed"
                );
                StorageError::DeleteFailed(e.to_string())
            })?;

        tracing::debug!(bucket = %self.bucket, key = %key, "S3 delete successful");
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(ctx)) if ctx.err().is_not_found() => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }
}
