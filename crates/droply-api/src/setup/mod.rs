//! Application wiring: database, storage, services, routes, server.

pub mod database;
pub mod routes;
pub mod server;

use crate::services::cleanup::CleanupJob;
use crate::services::lifecycle::TransferLifecycle;
use crate::services::notify::{EmailService, NotificationDispatcher};
use crate::state::AppState;
use axum::Router;
use droply_core::Config;
use droply_db::{RecipientRepository, TransferRepository, UserRepository};
use std::sync::Arc;

/// Build all services and the router. Also starts the background cleanup
/// loop.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router), anyhow::Error> {
    let pool = database::create_pool(&config).await?;

    let store = droply_storage::create_store(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize object storage: {}", e))?;

    let transfers = TransferRepository::new(pool.clone());
    let recipients = RecipientRepository::new(pool.clone());
    let users = UserRepository::new(pool.clone());

    let lifecycle = TransferLifecycle::new(
        transfers.clone(),
        recipients.clone(),
        users.clone(),
        store.clone(),
    );

    let email = EmailService::from_config(&config);
    if email.is_none() {
        tracing::warn!("SMTP not configured; recipient notifications will report failures");
    }
    let notifier =
        NotificationDispatcher::new(recipients.clone(), email, config.base_url.clone());

    let cleanup = Arc::new(CleanupJob::new(transfers.clone(), store.clone()));
    cleanup.clone().start(config.cleanup_interval_secs);

    let state = Arc::new(AppState {
        config: config.clone(),
        pool,
        store,
        transfers,
        recipients,
        users,
        lifecycle,
        notifier,
        cleanup,
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
