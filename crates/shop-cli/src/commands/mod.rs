//! CLI command implementations.

pub mod admin;
pub mod collections;
pub mod seed;

use std::sync::Arc;

use shop_service::ServiceConfig;
use shop_store::{CollectionStore, FileStore};
use thiserror::Error;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Storage failure.
    #[error("Store error: {0}")]
    Store(#[from] shop_store::StoreError),

    /// A service operation was rejected.
    #[error("{0}")]
    Service(#[from] shop_service::ApiError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: super_admin, admin")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Bundled seed data could not be parsed.
    #[error("Invalid seed data: {0}")]
    SeedData(#[from] serde_json::Error),
}

/// Open the file store configured by `DATA_DIR`.
pub fn open_store() -> Result<Arc<dyn CollectionStore>, CommandError> {
    let config = ServiceConfig::from_env();
    tracing::debug!(data_dir = %config.data_dir, "Opening store");
    Ok(Arc::new(FileStore::open(&config.data_dir)?))
}
