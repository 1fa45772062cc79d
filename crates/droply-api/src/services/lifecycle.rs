//! Transfer lifecycle: creation under plan limits, the public share view,
//! download issuance, and owner deletion.
//!
//! A transfer is visible to recipients only while `status = ACTIVE` and
//! `expires_at > now()`; both checks are made on every lookup because the
//! status flip lags behind the timestamp until cleanup runs.

use crate::auth::{hash_secret, verify_secret};
use chrono::{DateTime, Datelike, Duration, Utc};
use droply_core::models::transfer::{
    CreateTransferRequest, DownloadResponse, ShareBranding, ShareViewResponse, TransferStats,
};
use droply_core::models::{PlanLimits, PlanTier, Transfer, TransferEventType};
use droply_core::{slug::generate_slug, AppError};
use droply_db::{RecipientRepository, TransferRepository, UserRepository};
use droply_storage::ObjectStore;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use uuid::Uuid;

/// Presigned download URLs stay valid for one hour; the storage backend
/// enforces the expiry, not this service.
const DOWNLOAD_URL_TTL: StdDuration = StdDuration::from_secs(3600);

#[derive(Clone)]
pub struct TransferLifecycle {
    transfers: TransferRepository,
    recipients: RecipientRepository,
    users: UserRepository,
    store: Arc<dyn ObjectStore>,
}

/// UTC start of the calendar month containing `now`. The FREE-tier quota
/// is month-aligned, not a rolling 30 days.
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let first = now
        .date_naive()
        .with_day(1)
        .expect("the first of the month is always a valid date");
    DateTime::from_naive_utc_and_offset(
        first.and_hms_opt(0, 0, 0).expect("midnight is always valid"),
        Utc,
    )
}

impl TransferLifecycle {
    pub fn new(
        transfers: TransferRepository,
        recipients: RecipientRepository,
        users: UserRepository,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            transfers,
            recipients,
            users,
            store,
        }
    }

    /// Create a transfer for the authenticated owner.
    ///
    /// File bytes never pass through here; each input references a storage
    /// key obtained from the upload endpoints. Plan limits are enforced at
    /// creation time only.
    #[tracing::instrument(skip(self, request), fields(owner_id = %owner_id, plan = %plan))]
    pub async fn create_transfer(
        &self,
        owner_id: Uuid,
        plan: PlanTier,
        request: CreateTransferRequest,
    ) -> Result<Transfer, AppError> {
        if request.files.is_empty() {
            return Err(AppError::InvalidInput(
                "A transfer needs at least one file".to_string(),
            ));
        }

        let mut total_bytes: i64 = 0;
        for file in &request.files {
            if file.size_bytes <= 0 {
                return Err(AppError::InvalidInput(format!(
                    "File '{}' has an invalid size",
                    file.name
                )));
            }
            if file.b2_key.is_empty() {
                return Err(AppError::InvalidInput(format!(
                    "File '{}' is missing its storage key",
                    file.name
                )));
            }
            total_bytes = total_bytes.checked_add(file.size_bytes).ok_or_else(|| {
                AppError::InvalidInput("Total transfer size overflows".to_string())
            })?;
        }

        let limits = PlanLimits::for_tier(plan);

        if total_bytes > limits.max_transfer_bytes {
            return Err(AppError::PlanLimitExceeded(format!(
                "Transfer is {} bytes but the {} plan allows {} bytes. Upgrade your plan to send larger transfers.",
                total_bytes, plan, limits.max_transfer_bytes
            )));
        }

        let password_hash = match request.password.as_deref() {
            None => None,
            Some("") => {
                return Err(AppError::InvalidInput(
                    "Password must not be empty".to_string(),
                ));
            }
            Some(password) => {
                if !limits.password_protection {
                    return Err(AppError::PlanLimitExceeded(format!(
                        "Password protection is not available on the {} plan. Upgrade to protect transfers.",
                        plan
                    )));
                }
                Some(hash_secret(password)?)
            }
        };

        let now = Utc::now();
        let plan_expiry = now + Duration::days(limits.expiry_days);
        let expires_at = match request.expires_at {
            Some(requested) => {
                if requested <= now {
                    return Err(AppError::InvalidInput(
                        "expiresAt must be in the future".to_string(),
                    ));
                }
                if requested > plan_expiry {
                    return Err(AppError::PlanLimitExceeded(format!(
                        "The {} plan allows transfers to live at most {} days",
                        plan, limits.expiry_days
                    )));
                }
                requested
            }
            None => plan_expiry,
        };

        // Quota is the only check that needs the database.
        if let Some(cap) = limits.monthly_transfer_limit {
            let used = self
                .transfers
                .count_created_since(owner_id, start_of_month(now))
                .await?;
            if used >= cap {
                return Err(AppError::PlanLimitExceeded(format!(
                    "The {} plan allows {} transfers per month and you have used {}. Upgrade for unlimited transfers.",
                    plan, cap, used
                )));
            }
        }

        let slug = generate_slug();
        let (transfer, files) = self
            .transfers
            .create_with_files(
                owner_id,
                &slug,
                total_bytes,
                password_hash.as_deref(),
                expires_at,
                &request.files,
            )
            .await?;

        tracing::info!(
            transfer_id = %transfer.id,
            slug = %transfer.slug,
            files = files.len(),
            total_bytes,
            expires_at = %expires_at,
            password_protected = transfer.requires_password(),
            "Transfer created"
        );

        Ok(transfer)
    }

    /// Public share view: metadata, file list, and whether a password is
    /// required. Never exposes the hash.
    pub async fn share_view(&self, slug: &str) -> Result<ShareViewResponse, AppError> {
        let transfer = self.active_transfer(slug).await?;
        let files = self.transfers.list_files(transfer.id).await?;

        let branding = self.branding_for_owner(transfer.owner_id).await?;

        Ok(ShareViewResponse {
            id: transfer.id,
            slug: transfer.slug.clone(),
            expires_at: transfer.expires_at,
            requires_password: transfer.requires_password(),
            files: files.into_iter().map(Into::into).collect(),
            branding,
        })
    }

    /// Issue a presigned download URL for one file of a shared transfer.
    ///
    /// The DOWNLOAD event is appended on issuance: it is recorded whether
    /// or not the caller ever fetches the URL.
    #[tracing::instrument(skip(self, password))]
    pub async fn download_file(
        &self,
        slug: &str,
        file_id: Uuid,
        password: Option<&str>,
    ) -> Result<DownloadResponse, AppError> {
        let transfer = self.active_transfer(slug).await?;

        if let Some(hash) = transfer.password_hash.as_deref() {
            let supplied = password.ok_or_else(|| {
                AppError::Unauthorized("This transfer requires a password".to_string())
            })?;
            if !verify_secret(supplied, hash)? {
                return Err(AppError::Unauthorized("Incorrect password".to_string()));
            }
        }

        let file = self
            .transfers
            .find_file(transfer.id, file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found in this transfer".to_string()))?;

        let url = self
            .store
            .download_url(&file.storage_key, DOWNLOAD_URL_TTL)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        self.transfers
            .record_event(
                transfer.id,
                TransferEventType::Download,
                Some(serde_json::json!({
                    "file_id": file.id,
                    "file_name": file.display_name.clone(),
                })),
            )
            .await?;

        tracing::info!(
            transfer_id = %transfer.id,
            file_id = %file.id,
            "Download URL issued"
        );

        Ok(DownloadResponse {
            download_url: url,
            file_name: file.display_name,
            file_size: file.size_bytes,
            content_type: file.content_type,
        })
    }

    /// Delete a transfer the requesting user owns: storage objects first
    /// (best effort), then the row; child rows cascade.
    #[tracing::instrument(skip(self))]
    pub async fn delete_transfer(
        &self,
        transfer_id: Uuid,
        requesting_user: Uuid,
    ) -> Result<(), AppError> {
        let transfer = self
            .transfers
            .find_by_id(transfer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Transfer not found".to_string()))?;

        if transfer.owner_id != requesting_user {
            return Err(AppError::Forbidden(
                "You do not own this transfer".to_string(),
            ));
        }

        let files = self.transfers.list_files(transfer.id).await?;
        let keys: Vec<String> = files.into_iter().map(|f| f.storage_key).collect();
        let failed = self.store.delete_objects(&keys).await;
        if !failed.is_empty() {
            tracing::warn!(
                transfer_id = %transfer.id,
                failed = failed.len(),
                "Some storage objects could not be deleted; proceeding with row deletion"
            );
        }

        self.transfers.delete(transfer.id).await?;

        tracing::info!(transfer_id = %transfer.id, "Transfer deleted by owner");
        Ok(())
    }

    /// Owner-facing download/open counters.
    pub async fn stats(
        &self,
        transfer_id: Uuid,
        requesting_user: Uuid,
    ) -> Result<TransferStats, AppError> {
        let transfer = self
            .transfers
            .find_by_id(transfer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Transfer not found".to_string()))?;

        if transfer.owner_id != requesting_user {
            return Err(AppError::Forbidden(
                "You do not own this transfer".to_string(),
            ));
        }

        let downloads = self.transfers.download_count(transfer.id).await?;
        let (recipients, opened) = self.recipients.counts(transfer.id).await?;

        Ok(TransferStats {
            id: transfer.id,
            downloads,
            recipients,
            opened,
        })
    }

    async fn active_transfer(&self, slug: &str) -> Result<Transfer, AppError> {
        self.transfers
            .find_active_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound("Transfer not found or expired".to_string()))
    }

    /// Branding only shows for BUSINESS owners; other tiers always get
    /// the stock share page.
    async fn branding_for_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Option<ShareBranding>, AppError> {
        let owner = match self.users.find_user(owner_id).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        if PlanTier::parse(&owner.plan) != Some(PlanTier::Business) {
            return Ok(None);
        }

        Ok(self
            .users
            .branding_for(owner_id)
            .await?
            .map(|b| ShareBranding {
                company_name: b.company_name,
                logo_url: b.logo_url,
                accent_color: b.accent_color,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use droply_core::models::transfer::TransferFileInput;
    use droply_storage::MockStore;
    use sqlx::postgres::PgPoolOptions;

    #[test]
    fn start_of_month_truncates_to_the_first() {
        let now = Utc.with_ymd_and_hms(2026, 8, 19, 13, 45, 12).unwrap();
        let start = start_of_month(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn start_of_month_is_identity_on_the_first() {
        let now = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();
        assert_eq!(start_of_month(now), now);
    }

    #[test]
    fn quota_window_rolls_over_between_months() {
        let july = Utc.with_ymd_and_hms(2026, 7, 31, 23, 59, 59).unwrap();
        let august = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 1).unwrap();
        // A transfer created in July is outside August's window.
        assert!(july < start_of_month(august));
    }

    /// Lifecycle wired to a lazy (never-connected) pool; only paths that
    /// reject before touching the database may be exercised.
    fn lifecycle() -> TransferLifecycle {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy("postgresql://localhost/droply_test")
            .expect("lazy pool");
        TransferLifecycle::new(
            TransferRepository::new(pool.clone()),
            RecipientRepository::new(pool.clone()),
            UserRepository::new(pool),
            Arc::new(MockStore::new()),
        )
    }

    fn files(total_bytes: i64) -> Vec<TransferFileInput> {
        vec![TransferFileInput {
            b2_key: "transfers/test.bin".to_string(),
            name: "test.bin".to_string(),
            size_bytes: total_bytes,
            content_type: "application/octet-stream".to_string(),
        }]
    }

    #[tokio::test]
    async fn oversized_transfer_is_rejected_with_upgrade_prompt() {
        let lifecycle = lifecycle();
        // 6 GB against the 5 GB FREE limit
        let request = CreateTransferRequest {
            files: files(6 * 1024 * 1024 * 1024),
            expires_at: None,
            password: None,
        };
        let err = lifecycle
            .create_transfer(Uuid::new_v4(), PlanTier::Free, request)
            .await
            .expect_err("over the FREE size limit");
        match err {
            AppError::PlanLimitExceeded(msg) => assert!(msg.contains("Upgrade")),
            other => panic!("expected PlanLimitExceeded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn free_plan_may_not_set_a_password() {
        let lifecycle = lifecycle();
        let request = CreateTransferRequest {
            files: files(1024),
            expires_at: None,
            password: Some("abcd1234".to_string()),
        };
        let err = lifecycle
            .create_transfer(Uuid::new_v4(), PlanTier::Free, request)
            .await
            .expect_err("FREE forbids password protection");
        assert!(matches!(err, AppError::PlanLimitExceeded(_)));
    }

    #[tokio::test]
    async fn expiry_override_must_be_in_the_future() {
        let lifecycle = lifecycle();
        let request = CreateTransferRequest {
            files: files(1024),
            expires_at: Some(Utc::now() - Duration::days(1)),
            password: None,
        };
        let err = lifecycle
            .create_transfer(Uuid::new_v4(), PlanTier::Pro, request)
            .await
            .expect_err("past expiry");
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn expiry_override_beyond_plan_window_is_rejected() {
        let lifecycle = lifecycle();
        // PRO allows 30 days
        let request = CreateTransferRequest {
            files: files(1024),
            expires_at: Some(Utc::now() + Duration::days(31)),
            password: None,
        };
        let err = lifecycle
            .create_transfer(Uuid::new_v4(), PlanTier::Pro, request)
            .await
            .expect_err("beyond plan window");
        assert!(matches!(err, AppError::PlanLimitExceeded(_)));
    }

    #[tokio::test]
    async fn empty_file_list_is_rejected() {
        let lifecycle = lifecycle();
        let request = CreateTransferRequest {
            files: vec![],
            expires_at: None,
            password: None,
        };
        let err = lifecycle
            .create_transfer(Uuid::new_v4(), PlanTier::Pro, request)
            .await
            .expect_err("no files");
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn file_without_storage_key_is_rejected() {
        let lifecycle = lifecycle();
        let request = CreateTransferRequest {
            files: vec![TransferFileInput {
                b2_key: String::new(),
                name: "test.bin".to_string(),
                size_bytes: 1024,
                content_type: "application/octet-stream".to_string(),
            }],
            expires_at: None,
            password: None,
        };
        let err = lifecycle
            .create_transfer(Uuid::new_v4(), PlanTier::Pro, request)
            .await
            .expect_err("missing storage key");
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
