//! Expired-transfer cleanup.
//!
//! Runs on an interval and on demand from the cron/admin endpoints. Each
//! candidate is handled independently: storage deletion is best effort and
//! a failing row is recorded and skipped rather than aborting the batch.
//! Re-running after a partial failure only reprocesses rows still present,
//! so the job is idempotent.

use droply_core::models::transfer::CleanupReport;
use droply_core::AppError;
use droply_db::TransferRepository;
use droply_storage::ObjectStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

pub struct CleanupJob {
    transfers: TransferRepository,
    store: Arc<dyn ObjectStore>,
}

impl CleanupJob {
    pub fn new(transfers: TransferRepository, store: Arc<dyn ObjectStore>) -> Self {
        Self { transfers, store }
    }

    /// Spawn the periodic cleanup loop.
    pub fn start(self: Arc<Self>, every_secs: u64) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(every_secs));
            ticker.tick().await; // immediate first tick
            loop {
                ticker.tick().await;
                tracing::info!("Starting scheduled cleanup of expired transfers");
                match self.run().await {
                    Ok(report) => {
                        tracing::info!(
                            processed = report.processed,
                            deleted = report.deleted,
                            errors = report.errors.len(),
                            "Scheduled cleanup finished"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Scheduled cleanup failed");
                    }
                }
            }
        })
    }

    /// One cleanup pass over every expired transfer.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<CleanupReport, AppError> {
        let expired = self.transfers.find_expired().await?;
        let mut report = CleanupReport {
            processed: expired.len(),
            ..CleanupReport::default()
        };

        for transfer in expired {
            tracing::info!(
                transfer_id = %transfer.id,
                slug = %transfer.slug,
                expires_at = %transfer.expires_at,
                "Reaping expired transfer"
            );

            let keys = match self.transfers.list_files(transfer.id).await {
                Ok(files) => files.into_iter().map(|f| f.storage_key).collect::<Vec<_>>(),
                Err(e) => {
                    report
                        .errors
                        .push(format!("list files for {}: {}", transfer.id, e));
                    continue;
                }
            };

            for key in self.store.delete_objects(&keys).await {
                report
                    .errors
                    .push(format!("storage delete failed for {}", key));
            }

            match self.transfers.delete(transfer.id).await {
                Ok(rows) if rows > 0 => report.deleted += 1,
                Ok(_) => {
                    // Already gone (e.g. owner deleted concurrently); not an error.
                    tracing::debug!(transfer_id = %transfer.id, "Row already removed");
                }
                Err(e) => {
                    report
                        .errors
                        .push(format!("row delete failed for {}: {}", transfer.id, e));
                }
            }
        }

        Ok(report)
    }
}
