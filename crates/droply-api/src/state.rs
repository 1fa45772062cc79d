//! Application state shared across handlers.

use crate::services::cleanup::CleanupJob;
use crate::services::lifecycle::TransferLifecycle;
use crate::services::notify::NotificationDispatcher;
use droply_core::Config;
use droply_db::{RecipientRepository, TransferRepository, UserRepository};
use droply_storage::ObjectStore;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub store: Arc<dyn ObjectStore>,
    pub transfers: TransferRepository,
    pub recipients: RecipientRepository,
    pub users: UserRepository,
    pub lifecycle: TransferLifecycle,
    pub notifier: NotificationDispatcher,
    pub cleanup: Arc<CleanupJob>,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
