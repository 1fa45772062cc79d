//! Recipient notification endpoint.

use crate::auth::Owner;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use droply_core::models::recipient::{NotifyRequest, NotifyResponse};
use droply_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

/// Email the share link to a list of recipients.
#[utoipa::path(
    post,
    path = "/api/transfers/{id}/notify",
    tag = "transfers",
    params(("id" = Uuid, Path, description = "Transfer ID")),
    request_body = NotifyRequest,
    responses(
        (status = 200, description = "Per-recipient delivery outcomes", body = NotifyResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "No such transfer", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(owner_id = %owner.user_id, transfer_id = %id))]
pub async fn notify_recipients(
    owner: Owner,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<NotifyRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let transfer = state
        .transfers
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transfer not found".to_string()))?;

    if transfer.owner_id != owner.user_id {
        return Err(AppError::Forbidden("You do not own this transfer".to_string()).into());
    }

    let outcome = state
        .notifier
        .notify(&transfer, &request.recipients, request.message.as_deref())
        .await?;

    Ok(Json(outcome))
}
