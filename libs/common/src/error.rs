//! Custom error types for the common library
//!
//! This module defines application-specific error types that can be used
//! throughout the application.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for public-root storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem operation failed on the given path
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Every candidate file name in the directory was already taken
    #[error("No free file name left in {}", dir.display())]
    NamesExhausted { dir: PathBuf },
}

impl StorageError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Type alias for Result with StorageError
pub type StorageResult<T> = Result<T, StorageError>;

/// Custom error type for configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration sources could not be merged or deserialized
    #[error("Configuration error: {0}")]
    Load(#[from] ::config::ConfigError),

    /// The PORT variable is not a valid TCP port
    #[error("Invalid port: {0}")]
    InvalidPort(String),
}

/// Type alias for Result with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;
