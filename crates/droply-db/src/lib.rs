//! Postgres repositories for droply.
//!
//! All queries are dynamic sqlx (`query`/`query_as` + `bind`), so no
//! `DATABASE_URL` is needed at compile time. Migrations live in
//! `migrations/` and are embedded via `sqlx::migrate!`.

mod db;

pub use db::recipient::RecipientRepository;
pub use db::transfer::TransferRepository;
pub use db::user::{ApiKeyRow, UserRepository};

/// Embedded migrations, applied at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
