//! Email engagement tracking: open pixel and click callback.
//!
//! Stamps are first-write-wins; repeated opens or clicks never move the
//! recorded timestamps.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use droply_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

/// 1x1 transparent GIF served from the open-tracking endpoint.
const TRACKING_PIXEL: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, // GIF89a
    0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, // 1x1, global color table
    0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, // black, white
    0x21, 0xF9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, // transparent GCE
    0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, // image descriptor
    0x02, 0x02, 0x44, 0x01, 0x00, // image data
    0x3B, // trailer
];

/// Open pixel. Always serves the GIF; the stamp is recorded when the
/// recipient is known and not yet stamped.
#[utoipa::path(
    get,
    path = "/api/email/track/open/{recipient_id}",
    tag = "tracking",
    params(("recipient_id" = Uuid, Path, description = "Recipient tracking ID")),
    responses((status = 200, description = "1x1 tracking pixel", content_type = "image/gif"))
)]
pub async fn track_open(
    State(state): State<Arc<AppState>>,
    Path(recipient_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.recipients.mark_opened(recipient_id).await {
        Ok(true) => {
            tracing::debug!(recipient_id = %recipient_id, "Recipient open recorded");
        }
        Ok(false) => {
            // Unknown recipient or already stamped; serve the pixel either way.
        }
        Err(e) => {
            tracing::error!(error = %e, recipient_id = %recipient_id, "Failed to record open");
        }
    }

    (
        [
            (header::CONTENT_TYPE, "image/gif"),
            (header::CACHE_CONTROL, "no-store, max-age=0"),
        ],
        TRACKING_PIXEL,
    )
}

/// Click callback from the share page, stamping `downloaded_at`.
#[utoipa::path(
    post,
    path = "/api/email/track/click/{recipient_id}",
    tag = "tracking",
    params(("recipient_id" = Uuid, Path, description = "Recipient tracking ID")),
    responses(
        (status = 200, description = "Click recorded (or already recorded)"),
        (status = 404, description = "Unknown recipient", body = ErrorResponse)
    )
)]
pub async fn track_click(
    State(state): State<Arc<AppState>>,
    Path(recipient_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let recipient = state
        .recipients
        .find(recipient_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Unknown recipient".to_string()))?;

    let stamped = state.recipients.mark_downloaded(recipient.id).await?;
    if stamped {
        tracing::debug!(recipient_id = %recipient_id, "Recipient click recorded");
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_is_a_valid_single_frame_gif() {
        assert_eq!(&TRACKING_PIXEL[..6], b"GIF89a");
        assert_eq!(*TRACKING_PIXEL.last().expect("non-empty"), 0x3B);
        // 1x1 logical screen
        assert_eq!(TRACKING_PIXEL[6], 1);
        assert_eq!(TRACKING_PIXEL[8], 1);
    }
}
