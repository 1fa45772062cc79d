//! Owner-facing transfer endpoints: create, list, stats, delete.

use crate::auth::Owner;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use droply_core::models::transfer::{
    CreateTransferRequest, CreateTransferResponse, TransferStats, TransferSummary,
};
use std::sync::Arc;
use uuid::Uuid;

/// Create a transfer from already-uploaded files.
#[utoipa::path(
    post,
    path = "/api/transfers/create",
    tag = "transfers",
    request_body = CreateTransferRequest,
    responses(
        (status = 200, description = "Transfer created", body = CreateTransferResponse),
        (status = 400, description = "Invalid input or plan limit exceeded", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse)
    )
)]
pub async fn create_transfer(
    owner: Owner,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTransferRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let transfer = state
        .lifecycle
        .create_transfer(owner.user_id, owner.plan, request)
        .await?;

    Ok(Json(CreateTransferResponse {
        id: transfer.id,
        slug: transfer.slug,
        expires_at: transfer.expires_at,
    }))
}

/// List the owner's transfers, newest first.
#[utoipa::path(
    get,
    path = "/api/transfers",
    tag = "transfers",
    responses(
        (status = 200, description = "Transfers for this account", body = [TransferSummary]),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse)
    )
)]
pub async fn list_transfers(
    owner: Owner,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let transfers = state.transfers.list_by_owner(owner.user_id).await?;
    let summaries: Vec<TransferSummary> = transfers.into_iter().map(Into::into).collect();
    Ok(Json(summaries))
}

/// Download/open counters for one of the owner's transfers.
#[utoipa::path(
    get,
    path = "/api/transfers/{id}/stats",
    tag = "transfers",
    params(("id" = Uuid, Path, description = "Transfer ID")),
    responses(
        (status = 200, description = "Usage counters", body = TransferStats),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "No such transfer", body = ErrorResponse)
    )
)]
pub async fn transfer_stats(
    owner: Owner,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let stats = state.lifecycle.stats(id, owner.user_id).await?;
    Ok(Json(stats))
}

/// Delete a transfer and its stored objects. Owner only.
#[utoipa::path(
    delete,
    path = "/api/transfers/{id}/delete",
    tag = "transfers",
    params(("id" = Uuid, Path, description = "Transfer ID")),
    responses(
        (status = 200, description = "Transfer deleted"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "No such transfer", body = ErrorResponse)
    )
)]
pub async fn delete_transfer(
    owner: Owner,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.lifecycle.delete_transfer(id, owner.user_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
