//! Error types for document I/O.

use std::path::PathBuf;

/// Result type for document operations.
pub type DocResult<T> = Result<T, DocError>;

/// Errors that can occur while loading or saving a document.
///
/// Parsing itself never fails; only the file system can.
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    /// Failed to read the document file.
    #[error("Failed to read file {path}: {message}")]
    ReadError { path: PathBuf, message: String },

    /// Failed to write the document file.
    #[error("Failed to write file {path}: {message}")]
    WriteError { path: PathBuf, message: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
