//! Custom error types for the common library
//!
//! This module defines the error type raised by the file-backed
//! persistence layer.

use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Error occurred while reading or writing a collection file
    #[error("Storage I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Collection file content could not be encoded or decoded
    #[error("Storage serialization error on {}: {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn serialization(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StorageError::Serialization {
            path: path.into(),
            source,
        }
    }
}

/// Type alias for Result with StorageError
pub type StorageResult<T> = Result<T, StorageError>;
