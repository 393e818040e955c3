//! Error types for the pagekv command line.

use pagekv_common::PagekvError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] PagekvError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse '{token}': {reason}")]
    Parse { token: String, reason: String },

    #[error("input ended while reading {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("logging setup failed: {0}")]
    Logging(String),
}
