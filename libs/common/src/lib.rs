//! Common library for the portfolio redirect service
//!
//! This crate provides the pieces that do not depend on the HTTP layer:
//! configuration loading, storage error types, and the on-disk layout of
//! the public root where uploads and generated documents live.

pub mod config;
pub mod error;
pub mod storage;

/// Example usage of the storage module
///
/// ```rust,no_run
/// use common::config::ServerConfig;
/// use common::storage::PublicStorage;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ServerConfig::from_env()?;
///     let storage = PublicStorage::new(&config.public_root);
///     storage.ensure_layout().await?;
///     println!("Serving files from {}", storage.root().display());
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
