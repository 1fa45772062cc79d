//! Account rows used by the API-key auth path and share branding.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Account row. Plan is stored as text (`FREE`/`PRO`/`BUSINESS`); parse via
/// [`crate::models::PlanTier::parse`].
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub plan: String,
    pub created_at: DateTime<Utc>,
}

/// Custom branding row, one per BUSINESS account.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Branding {
    pub user_id: Uuid,
    pub company_name: String,
    pub logo_url: Option<String>,
    pub accent_color: Option<String>,
}
