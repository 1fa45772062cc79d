//! On-demand cleanup triggers (admin console and external cron).

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    response::IntoResponse,
    Json,
};
use droply_core::models::transfer::CleanupReport;
use droply_core::AppError;
use std::sync::Arc;

/// When CRON_SECRET is configured, both cleanup triggers require it as a
/// bearer token. Without it the endpoints are open (development setups).
fn check_cron_secret(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = state.config.cron_secret.as_deref() else {
        return Ok(());
    };

    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    if presented != Some(expected) {
        return Err(AppError::Unauthorized("Invalid cleanup token".to_string()));
    }
    Ok(())
}

/// Run one cleanup pass now.
#[utoipa::path(
    post,
    path = "/api/admin/cleanup",
    tag = "cleanup",
    responses(
        (status = 200, description = "Cleanup report", body = CleanupReport),
        (status = 401, description = "Invalid cleanup token", body = ErrorResponse)
    )
)]
pub async fn admin_cleanup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpAppError> {
    check_cron_secret(&state, &headers)?;

    let report = state.cleanup.run().await?;
    Ok(Json(report))
}

/// Cron entry point; same job as the admin trigger.
#[utoipa::path(
    post,
    path = "/api/cron/cleanup",
    tag = "cleanup",
    responses(
        (status = 200, description = "Cleanup report", body = CleanupReport),
        (status = 401, description = "Invalid cleanup token", body = ErrorResponse)
    )
)]
pub async fn cron_cleanup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpAppError> {
    check_cron_secret(&state, &headers)?;

    let report = state.cleanup.run().await?;
    Ok(Json(report))
}
