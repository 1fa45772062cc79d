//! Recipient rows and tracking stamps.

use droply_core::models::Recipient;
use droply_core::AppError;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct RecipientRepository {
    pool: PgPool,
}

impl RecipientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a recipient stamped as sent now.
    pub async fn insert_sent(
        &self,
        transfer_id: Uuid,
        email: &str,
    ) -> Result<Recipient, AppError> {
        let row = sqlx::query_as::<_, Recipient>(
            r#"
            INSERT INTO recipient (transfer_id, email, sent_at)
            VALUES ($1, $2, now())
            RETURNING id, transfer_id, email, sent_at, opened_at, downloaded_at
            "#,
        )
        .bind(transfer_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Stamp `opened_at`, first write wins. Returns whether a row changed.
    pub async fn mark_opened(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE recipient SET opened_at = now()
            WHERE id = $1 AND opened_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stamp `downloaded_at`, first write wins. Returns whether a row changed.
    pub async fn mark_downloaded(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE recipient SET downloaded_at = now()
            WHERE id = $1 AND downloaded_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Recipient>, AppError> {
        let row = sqlx::query_as::<_, Recipient>(
            r#"
            SELECT id, transfer_id, email, sent_at, opened_at, downloaded_at
            FROM recipient
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// (total, opened) recipient counts for a transfer.
    pub async fn counts(&self, transfer_id: Uuid) -> Result<(i64, i64), AppError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(opened_at) AS opened
            FROM recipient
            WHERE transfer_id = $1
            "#,
        )
        .bind(transfer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((row.get::<i64, _>("total"), row.get::<i64, _>("opened")))
    }
}
