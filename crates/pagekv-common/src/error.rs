//! Error types for pagekv.

use thiserror::Error;

/// Result type alias using PagekvError.
pub type Result<T> = std::result::Result<T, PagekvError>;

/// Errors that can occur in pagekv operations.
#[derive(Debug, Error)]
pub enum PagekvError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Page errors
    #[error("Invalid node type {tag} on page {page_id}")]
    InvalidNodeType { page_id: u32, tag: u8 },

    #[error("Page corrupted: {page_id}, reason: {reason}")]
    PageCorrupted { page_id: u32, reason: String },

    #[error("Page cache has no frame available")]
    CacheExhausted,

    // B+ tree errors
    #[error("Key too large: {size} bytes (max {max})")]
    KeyTooLarge { size: usize, max: usize },

    #[error("B+ tree corrupted: {0}")]
    BTreeCorrupted(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}
