//! Configuration structures for pagekv.

use crate::error::{PagekvError, Result};
use crate::page::{INTERNAL_MAX_CHILDREN, LEAF_MAX_RECORDS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Shape of the B+ tree nodes and the key hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum records per leaf before it splits.
    pub leaf_capacity: usize,
    /// A non-root leaf below this many records is rebalanced.
    pub leaf_merge_threshold: usize,
    /// Maximum children per internal node before it splits.
    pub internal_capacity: usize,
    /// A non-root internal node below this many children is rebalanced.
    pub internal_merge_threshold: usize,
    /// Mask applied at every step of the key hash. Narrow masks force collisions.
    pub hash_mask: u32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            leaf_capacity: 48,
            leaf_merge_threshold: 16,
            internal_capacity: 336,
            internal_merge_threshold: 112,
            hash_mask: 0x00FF_FFFF,
        }
    }
}

impl TreeConfig {
    /// Checks that splits and merges keep every node inside its bounds.
    pub fn validate(&self) -> Result<()> {
        check_geometry(
            "leaf",
            self.leaf_capacity,
            self.leaf_merge_threshold,
            LEAF_MAX_RECORDS,
        )?;
        check_geometry(
            "internal",
            self.internal_capacity,
            self.internal_merge_threshold,
            INTERNAL_MAX_CHILDREN,
        )
    }
}

fn check_geometry(kind: &str, capacity: usize, threshold: usize, page_max: usize) -> Result<()> {
    if capacity < 3 || capacity > page_max {
        return Err(PagekvError::ConfigError(format!(
            "{kind}_capacity must be within 3..={page_max}, got {capacity}"
        )));
    }
    if threshold < 2 {
        return Err(PagekvError::ConfigError(format!(
            "{kind}_merge_threshold must be at least 2, got {threshold}"
        )));
    }
    // A split of capacity + 1 entries leaves the smaller half with (capacity + 1) / 2.
    if (capacity + 1) / 2 < threshold {
        return Err(PagekvError::ConfigError(format!(
            "{kind} split of {capacity} would underflow merge threshold {threshold}"
        )));
    }
    // A merge joins threshold - 1 entries with a sibling holding exactly threshold.
    if 2 * threshold - 1 > capacity {
        return Err(PagekvError::ConfigError(format!(
            "{kind} merge at threshold {threshold} would overflow capacity {capacity}"
        )));
    }
    Ok(())
}

/// Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the page, metadata and root files.
    pub data_dir: PathBuf,
    /// Number of page frames held in memory.
    pub cache_pages: usize,
    /// Enable fsync when the store is flushed or closed.
    pub fsync_enabled: bool,
    /// Node geometry.
    pub tree: TreeConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            cache_pages: 4096, // 16 MB with 4 KB pages
            fsync_enabled: true,
            tree: TreeConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Creates a default configuration rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Validates the whole configuration.
    pub fn validate(&self) -> Result<()> {
        if self.cache_pages == 0 {
            return Err(PagekvError::ConfigError(
                "cache_pages must be at least 1".to_string(),
            ));
        }
        self.tree.validate()
    }

    /// Path of the page file.
    pub fn data_path(&self) -> PathBuf {
        self.data_dir.join("data.bin")
    }

    /// Path of the metadata file (file size and free page ids).
    pub fn info_path(&self) -> PathBuf {
        self.data_dir.join("info.bin")
    }

    /// Path of the root page id file.
    pub fn root_path(&self) -> PathBuf {
        self.data_dir.join("root.bin")
    }
}
