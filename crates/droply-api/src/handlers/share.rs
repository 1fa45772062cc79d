//! Public share endpoints: transfer view and per-file download.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use droply_core::models::transfer::{DownloadResponse, ShareViewResponse};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct DownloadQuery {
    /// File to download
    #[serde(rename = "fileId")]
    pub file_id: Uuid,
    /// Share password, if the transfer is protected
    pub password: Option<String>,
}

/// Public share view. Only ACTIVE, unexpired transfers resolve.
#[utoipa::path(
    get,
    path = "/api/share/{slug}",
    tag = "share",
    params(("slug" = String, Path, description = "Share slug")),
    responses(
        (status = 200, description = "Transfer metadata and files", body = ShareViewResponse),
        (status = 404, description = "Unknown, expired, or inactive transfer", body = ErrorResponse)
    )
)]
pub async fn share_view(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let view = state.lifecycle.share_view(&slug).await?;
    Ok(Json(view))
}

/// Issue a presigned download URL for one file. Appends a DOWNLOAD event
/// on issuance.
#[utoipa::path(
    get,
    path = "/api/share/{slug}/download",
    tag = "share",
    params(
        ("slug" = String, Path, description = "Share slug"),
        DownloadQuery
    ),
    responses(
        (status = 200, description = "Presigned URL", body = DownloadResponse),
        (status = 401, description = "Password required or incorrect", body = ErrorResponse),
        (status = 404, description = "Unknown transfer or file", body = ErrorResponse)
    )
)]
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state
        .lifecycle
        .download_file(&slug, query.file_id, query.password.as_deref())
        .await?;
    Ok(Json(response))
}
