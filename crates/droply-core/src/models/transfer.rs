//! Transfer, file object, and event rows plus the wire DTOs for the
//! transfer and share endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status stored in `transfer.status`.
///
/// Share lookups must check `expires_at` as well: cleanup may lag behind
/// the timestamp, so a row can still read ACTIVE after its expiry passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferStatus {
    Active,
    Expired,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Active => "ACTIVE",
            TransferStatus::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shareable, expiring bundle of uploaded files.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Transfer {
    pub id: Uuid,
    pub slug: String,
    pub owner_id: Uuid,
    pub status: String,
    pub total_bytes: i64,
    /// Argon2 hash; never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    pub fn requires_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// One uploaded file belonging to a transfer. Immutable after creation;
/// removed only by the transfer's cascade.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FileObject {
    pub id: Uuid,
    pub transfer_id: Uuid,
    pub storage_key: String,
    pub display_name: String,
    pub size_bytes: i64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only event log entry types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferEventType {
    Created,
    Download,
}

impl TransferEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferEventType::Created => "CREATED",
            TransferEventType::Download => "DOWNLOAD",
        }
    }
}

impl std::fmt::Display for TransferEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only log row; never mutated, removed only via cascade.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TransferEvent {
    pub id: Uuid,
    pub transfer_id: Uuid,
    pub event_type: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

// ----- Wire DTOs -----

/// One file in a transfer-creation request. The storage key comes from the
/// upload endpoints; file bytes never pass through the transfer API.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransferFileInput {
    /// Storage key returned by `POST /api/upload/create`
    pub b2_key: String,
    /// Display name shown on the share page
    pub name: String,
    pub size_bytes: i64,
    pub content_type: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTransferRequest {
    pub files: Vec<TransferFileInput>,
    /// Optional explicit expiry; must fall within the plan's window
    #[serde(rename = "expiresAt")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Optional share password (hashed before storage)
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateTransferResponse {
    pub id: Uuid,
    pub slug: String,
    pub expires_at: DateTime<Utc>,
}

/// File entry on the public share page.
#[derive(Debug, Serialize, ToSchema)]
pub struct ShareFile {
    pub id: Uuid,
    pub name: String,
    pub size_bytes: i64,
    pub content_type: String,
}

impl From<FileObject> for ShareFile {
    fn from(file: FileObject) -> Self {
        ShareFile {
            id: file.id,
            name: file.display_name,
            size_bytes: file.size_bytes,
            content_type: file.content_type,
        }
    }
}

/// Custom branding shown on BUSINESS owners' share pages.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShareBranding {
    pub company_name: String,
    pub logo_url: Option<String>,
    pub accent_color: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShareViewResponse {
    pub id: Uuid,
    pub slug: String,
    pub expires_at: DateTime<Utc>,
    pub requires_password: bool,
    pub files: Vec<ShareFile>,
    pub branding: Option<ShareBranding>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadResponse {
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "fileSize")]
    pub file_size: i64,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

/// Owner-facing transfer summary for the dashboard listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferSummary {
    pub id: Uuid,
    pub slug: String,
    pub status: String,
    pub total_bytes: i64,
    pub requires_password: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Transfer> for TransferSummary {
    fn from(t: Transfer) -> Self {
        TransferSummary {
            id: t.id,
            slug: t.slug.clone(),
            status: t.status.clone(),
            total_bytes: t.total_bytes,
            requires_password: t.requires_password(),
            expires_at: t.expires_at,
            created_at: t.created_at,
        }
    }
}

/// Download/open counters for one transfer.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferStats {
    pub id: Uuid,
    pub downloads: i64,
    pub recipients: i64,
    pub opened: i64,
}

/// Result of one cleanup pass.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct CleanupReport {
    /// Expired transfers considered
    pub processed: usize,
    /// Rows actually removed
    pub deleted: usize,
    /// Human-readable descriptions of steps that failed
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_never_serialized() {
        let transfer = Transfer {
            id: Uuid::new_v4(),
            slug: "abc".to_string(),
            owner_id: Uuid::new_v4(),
            status: TransferStatus::Active.as_str().to_string(),
            total_bytes: 42,
            password_hash: Some("$argon2id$v=19$secret".to_string()),
            expires_at: Utc::now(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&transfer).expect("serialize");
        assert!(json.get("password_hash").is_none());
        assert!(transfer.requires_password());
    }

    #[test]
    fn create_request_accepts_wire_field_names() {
        let body = serde_json::json!({
            "files": [{
                "b2_key": "transfers/ab/cd.bin",
                "name": "report.pdf",
                "size_bytes": 1024,
                "content_type": "application/pdf"
            }],
            "expiresAt": "2026-09-01T00:00:00Z",
            "password": "hunter2"
        });
        let req: CreateTransferRequest = serde_json::from_value(body).expect("deserialize");
        assert_eq!(req.files.len(), 1);
        assert_eq!(req.files[0].b2_key, "transfers/ab/cd.bin");
        assert!(req.expires_at.is_some());
    }
}
