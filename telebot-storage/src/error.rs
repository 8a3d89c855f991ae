//! Storage error types.

use thiserror::Error;

/// Errors that can occur when using storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Not a directory: {0}")]
    NotADirectory(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Not valid UTF-8: {0}")]
    Encoding(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
