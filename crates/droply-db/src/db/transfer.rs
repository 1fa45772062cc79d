//! Transfer, file-object, and event queries.

use chrono::{DateTime, Utc};
use droply_core::models::transfer::TransferFileInput;
use droply_core::models::{FileObject, Transfer, TransferEventType};
use droply_core::AppError;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct TransferRepository {
    pool: PgPool,
}

impl TransferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a transfer and all of its file rows in one transaction, plus
    /// the CREATED event. Either everything lands or nothing does.
    pub async fn create_with_files(
        &self,
        owner_id: Uuid,
        slug: &str,
        total_bytes: i64,
        password_hash: Option<&str>,
        expires_at: DateTime<Utc>,
        files: &[TransferFileInput],
    ) -> Result<(Transfer, Vec<FileObject>), AppError> {
        let mut tx = self.pool.begin().await?;

        let transfer = sqlx::query_as::<_, Transfer>(
            r#"
            INSERT INTO transfer (slug, owner_id, status, total_bytes, password_hash, expires_at)
            VALUES ($1, $2, 'ACTIVE', $3, $4, $5)
            RETURNING id, slug, owner_id, status, total_bytes, password_hash, expires_at, created_at
            "#,
        )
        .bind(slug)
        .bind(owner_id)
        .bind(total_bytes)
        .bind(password_hash)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut file_rows = Vec::with_capacity(files.len());
        for file in files {
            let row = sqlx::query_as::<_, FileObject>(
                r#"
                INSERT INTO file_object (transfer_id, storage_key, display_name, size_bytes, content_type)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, transfer_id, storage_key, display_name, size_bytes, content_type, created_at
                "#,
            )
            .bind(transfer.id)
            .bind(&file.b2_key)
            .bind(&file.name)
            .bind(file.size_bytes)
            .bind(&file.content_type)
            .fetch_one(&mut *tx)
            .await?;
            file_rows.push(row);
        }

        sqlx::query(
            r#"
            INSERT INTO transfer_event (transfer_id, event_type, metadata)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(transfer.id)
        .bind(TransferEventType::Created.as_str())
        .bind(serde_json::json!({ "files": files.len(), "total_bytes": total_bytes }))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((transfer, file_rows))
    }

    /// Transfers created by this owner since `since` (monthly quota check).
    pub async fn count_created_since(
        &self,
        owner_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS n FROM transfer
            WHERE owner_id = $1 AND created_at >= $2
            "#,
        )
        .bind(owner_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("n"))
    }

    /// Share lookup. Both gates live in the query: a row must read ACTIVE
    /// *and* be unexpired by timestamp, since the cleanup job can lag.
    pub async fn find_active_by_slug(&self, slug: &str) -> Result<Option<Transfer>, AppError> {
        let row = sqlx::query_as::<_, Transfer>(
            r#"
            SELECT id, slug, owner_id, status, total_bytes, password_hash, expires_at, created_at
            FROM transfer
            WHERE slug = $1 AND status = 'ACTIVE' AND expires_at > now()
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Transfer>, AppError> {
        let row = sqlx::query_as::<_, Transfer>(
            r#"
            SELECT id, slug, owner_id, status, total_bytes, password_hash, expires_at, created_at
            FROM transfer
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Transfer>, AppError> {
        let rows = sqlx::query_as::<_, Transfer>(
            r#"
            SELECT id, slug, owner_id, status, total_bytes, password_hash, expires_at, created_at
            FROM transfer
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn list_files(&self, transfer_id: Uuid) -> Result<Vec<FileObject>, AppError> {
        let rows = sqlx::query_as::<_, FileObject>(
            r#"
            SELECT id, transfer_id, storage_key, display_name, size_bytes, content_type, created_at
            FROM file_object
            WHERE transfer_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(transfer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn find_file(
        &self,
        transfer_id: Uuid,
        file_id: Uuid,
    ) -> Result<Option<FileObject>, AppError> {
        let row = sqlx::query_as::<_, FileObject>(
            r#"
            SELECT id, transfer_id, storage_key, display_name, size_bytes, content_type, created_at
            FROM file_object
            WHERE transfer_id = $1 AND id = $2
            "#,
        )
        .bind(transfer_id)
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Transfers eligible for cleanup: past their expiry timestamp, or
    /// already flipped to EXPIRED.
    pub async fn find_expired(&self) -> Result<Vec<Transfer>, AppError> {
        let rows = sqlx::query_as::<_, Transfer>(
            r#"
            SELECT id, slug, owner_id, status, total_bytes, password_hash, expires_at, created_at
            FROM transfer
            WHERE expires_at <= now() OR status = 'EXPIRED'
            ORDER BY expires_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Delete the row; file objects, recipients, and events cascade.
    pub async fn delete(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM transfer WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Append an event row. Events are never updated or deleted directly.
    pub async fn record_event(
        &self,
        transfer_id: Uuid,
        event_type: TransferEventType,
        metadata: Option<serde_json::Value>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO transfer_event (transfer_id, event_type, metadata)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(transfer_id)
        .bind(event_type.as_str())
        .bind(metadata)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn download_count(&self, transfer_id: Uuid) -> Result<i64, AppError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS n FROM transfer_event
            WHERE transfer_id = $1 AND event_type = $2
            "#,
        )
        .bind(transfer_id)
        .bind(TransferEventType::Download.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("n"))
    }
}
