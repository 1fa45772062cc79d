//! Multipart upload endpoints.
//!
//! Clients upload file bytes directly to the object store through the
//! presigned part URLs returned here; the API only brokers URLs and
//! finalization. Nothing in this module touches the database.

use crate::auth::Owner;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use droply_core::models::PlanLimits;
use droply_core::AppError;
use droply_storage::UploadedPart;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUploadRequest {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "fileSize")]
    pub file_size: u64,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateUploadResponse {
    #[serde(rename = "uploadId")]
    pub upload_id: String,
    pub key: String,
    #[serde(rename = "partUrls")]
    pub part_urls: Vec<String>,
    #[serde(rename = "partSize")]
    pub part_size: u64,
}

/// One uploaded part as echoed back by the store after a presigned PUT.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadPartInput {
    #[serde(rename = "PartNumber")]
    pub part_number: i32,
    #[serde(rename = "ETag")]
    pub etag: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteUploadRequest {
    #[serde(rename = "uploadId")]
    pub upload_id: String,
    pub key: String,
    pub parts: Vec<UploadPartInput>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteUploadResponse {
    pub success: bool,
    pub key: String,
}

/// Initiate a multipart upload and return one presigned PUT URL per part.
#[utoipa::path(
    post,
    path = "/api/upload/create",
    tag = "upload",
    request_body = CreateUploadRequest,
    responses(
        (status = 200, description = "Upload plan issued", body = CreateUploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 500, description = "Storage unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(owner_id = %owner.user_id))]
pub async fn create_upload(
    owner: Owner,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if request.file_name.trim().is_empty() {
        return Err(AppError::InvalidInput("fileName is required".to_string()).into());
    }
    if request.file_size == 0 {
        return Err(AppError::InvalidInput("fileSize must be greater than 0".to_string()).into());
    }
    if request.content_type.trim().is_empty() {
        return Err(AppError::InvalidInput("contentType is required".to_string()).into());
    }

    // A single file can never exceed what the owner's plan allows per transfer.
    let limits = PlanLimits::for_tier(owner.plan);
    if request.file_size > limits.max_transfer_bytes as u64 {
        return Err(AppError::PlanLimitExceeded(format!(
            "File is {} bytes but the {} plan allows {} bytes per transfer. Upgrade your plan to send larger files.",
            request.file_size, owner.plan, limits.max_transfer_bytes
        ))
        .into());
    }

    let upload = state
        .store
        .create_multipart_upload(&request.file_name, request.file_size, &request.content_type)
        .await?;

    tracing::info!(
        key = %upload.key,
        parts = upload.part_urls.len(),
        size_bytes = request.file_size,
        "Upload plan issued"
    );

    Ok(Json(CreateUploadResponse {
        upload_id: upload.upload_id,
        key: upload.key,
        part_urls: upload.part_urls,
        part_size: upload.part_size,
    }))
}

/// Finalize a multipart upload once all parts are stored.
#[utoipa::path(
    post,
    path = "/api/upload/complete",
    tag = "upload",
    request_body = CompleteUploadRequest,
    responses(
        (status = 200, description = "Object finalized", body = CompleteUploadResponse),
        (status = 400, description = "Missing parts or mismatched ETags", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(owner_id = %owner.user_id, key = %request.key))]
pub async fn complete_upload(
    owner: Owner,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompleteUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if request.parts.is_empty() {
        return Err(AppError::InvalidInput("parts must not be empty".to_string()).into());
    }

    let parts: Vec<UploadedPart> = request
        .parts
        .iter()
        .map(|p| UploadedPart {
            part_number: p.part_number,
            etag: p.etag.clone(),
        })
        .collect();

    state
        .store
        .complete_multipart_upload(&request.key, &request.upload_id, &parts)
        .await?;

    tracing::info!(parts = parts.len(), "Multipart upload finalized");

    Ok(Json(CompleteUploadResponse {
        success: true,
        key: request.key,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_request_accepts_s3_style_part_casing() {
        let body = serde_json::json!({
            "uploadId": "abc",
            "key": "transfers/x.bin",
            "parts": [
                { "PartNumber": 1, "ETag": "\"9bb58f26\"" },
                { "PartNumber": 2, "ETag": "\"7c211433\"" }
            ]
        });
        let req: CompleteUploadRequest = serde_json::from_value(body).expect("deserialize");
        assert_eq!(req.parts.len(), 2);
        assert_eq!(req.parts[0].part_number, 1);
        assert_eq!(req.parts[1].etag, "\"7c211433\"");
    }

    #[test]
    fn create_request_uses_camel_case_fields() {
        let body = serde_json::json!({
            "fileName": "slides.key",
            "fileSize": 123456,
            "contentType": "application/octet-stream"
        });
        let req: CreateUploadRequest = serde_json::from_value(body).expect("deserialize");
        assert_eq!(req.file_name, "slides.key");
        assert_eq!(req.file_size, 123456);
    }
}
