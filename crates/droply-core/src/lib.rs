//! Core types for the droply file-transfer service: configuration, the
//! error taxonomy, domain models, and the plan policy table.

pub mod config;
pub mod error;
pub mod models;
pub mod slug;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
