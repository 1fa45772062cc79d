//! Account and API-key lookups used by the auth path, plus branding.

use chrono::{DateTime, Utc};
use droply_core::models::{Branding, User};
use droply_core::AppError;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Active API-key candidate matched by prefix; the caller verifies the
/// full key against `key_hash`.
#[derive(Debug, Clone, FromRow)]
pub struct ApiKeyRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub key_hash: String,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active keys sharing this prefix. Prefixes are not unique, so the
    /// caller must verify the hash of each candidate.
    pub async fn find_api_keys_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<ApiKeyRow>, AppError> {
        let rows = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT id, user_id, key_hash, last_used_at
            FROM api_key
            WHERE key_prefix = $1 AND is_active
            "#,
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn touch_api_key(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE api_key SET last_used_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, plan, created_at
            FROM app_user
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn branding_for(&self, user_id: Uuid) -> Result<Option<Branding>, AppError> {
        let row = sqlx::query_as::<_, Branding>(
            r#"
            SELECT user_id, company_name, logo_url, accent_color
            FROM custom_branding
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
