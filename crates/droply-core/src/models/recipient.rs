//! Recipient rows and notification DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One notified recipient of a transfer. The three timestamps are each set
/// at most once (first-write-wins guards in the repository).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Recipient {
    pub id: Uuid,
    pub transfer_id: Uuid,
    pub email: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub downloaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NotifyRequest {
    pub recipients: Vec<String>,
    pub message: Option<String>,
}

/// Delivery outcome for a single recipient, so callers can retry just the
/// failed subset.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecipientOutcome {
    pub email: String,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotifyResponse {
    pub sent: usize,
    pub total: usize,
    pub results: Vec<RecipientOutcome>,
}
