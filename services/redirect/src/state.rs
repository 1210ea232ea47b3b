//! Application state shared across handlers

use common::config::ServerConfig;
use common::error::StorageResult;
use common::storage::PublicStorage;

use crate::generator::RedirectPageGenerator;

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub storage: PublicStorage,
    pub generator: RedirectPageGenerator,
    /// Request body cap in bytes; `None` lifts the limit entirely
    pub upload_limit: Option<usize>,
}

impl AppState {
    /// Create state over an existing storage layout
    pub fn new(storage: PublicStorage, upload_limit: Option<usize>) -> Self {
        Self {
            generator: RedirectPageGenerator::new(storage.clone()),
            storage,
            upload_limit,
        }
    }

    /// Build state from configuration, creating the storage directories
    pub async fn from_config(config: &ServerConfig) -> StorageResult<Self> {
        let storage = PublicStorage::new(&config.public_root);
        storage.ensure_layout().await?;

        let upload_limit = config
            .max_upload_bytes
            .map(|bytes| usize::try_from(bytes).unwrap_or(usize::MAX));

        Ok(Self::new(storage, upload_limit))
    }
}
