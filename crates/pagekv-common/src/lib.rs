//! pagekv common types, errors, and configuration.
//!
//! This crate provides shared definitions used across all pagekv components.

pub mod config;
pub mod error;
pub mod page;

pub use config::{StoreConfig, TreeConfig};
pub use error::{PagekvError, Result};
pub use page::{NodeKind, PageId, MAX_KEY_LEN, PAGE_SIZE};
