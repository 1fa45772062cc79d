//! Database pool setup and migrations.

use droply_core::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

pub async fn create_pool(config: &Config) -> Result<PgPool, anyhow::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .connect(&config.database_url)
        .await?;

    droply_db::MIGRATOR.run(&pool).await?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Database pool ready, migrations applied"
    );

    Ok(pool)
}
