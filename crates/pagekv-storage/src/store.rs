//! Key-value store facade over the B+ tree.
//!
//! A store directory holds three files:
//! - `data.bin`: fixed-size node pages
//! - `info.bin`: page file size and free page ids
//! - `root.bin`: root page id, little endian `u32`

use crate::btree::{BPlusTree, Node, TreeShape};
use bytes::Bytes;
use pagekv_buffer::{PageManager, PageManagerConfig, PageManagerStats};
use pagekv_common::{PageId, PagekvError, Result, StoreConfig};
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Persistent multimap from string keys to `i32` values.
///
/// Writes reach disk on eviction, [`flush`](Self::flush), [`close`](Self::close)
/// or drop. There is no write-ahead log: a crash loses whatever was still
/// only in memory.
pub struct KvStore {
    tree: BPlusTree,
    config: StoreConfig,
    closed: bool,
}

impl KvStore {
    /// Opens the store in `config.data_dir`, creating an empty one if no
    /// root file exists.
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.data_dir)?;

        let pages = PageManager::<Node>::open(PageManagerConfig {
            capacity: config.cache_pages,
            data_path: config.data_path(),
            meta_path: config.info_path(),
            fsync_enabled: config.fsync_enabled,
        })?;

        let tree = match read_root(&config.root_path())? {
            Some(root) => BPlusTree::open(pages, root, config.tree.clone())?,
            None => BPlusTree::create(pages, config.tree.clone())?,
        };

        info!(
            data_dir = %config.data_dir.display(),
            root = %tree.root(),
            cache_pages = config.cache_pages,
            "store.open"
        );
        Ok(Self {
            tree,
            config,
            closed: false,
        })
    }

    /// Deletes any existing store files in `config.data_dir`, then opens an
    /// empty store.
    pub fn open_fresh(config: StoreConfig) -> Result<Self> {
        for path in [config.data_path(), config.info_path(), config.root_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "store.reset"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Self::open(config)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current root page.
    pub fn root(&self) -> PageId {
        self.tree.root()
    }

    /// Adds `(key, value)`. Inserting an existing pair stores it again.
    pub fn insert(&mut self, key: impl AsRef<[u8]>, value: i32) -> Result<()> {
        self.tree.insert(key.as_ref(), value)
    }

    /// Removes one `(key, value)` record. Returns false when the pair is absent.
    pub fn delete(&mut self, key: impl AsRef<[u8]>, value: i32) -> Result<bool> {
        self.tree.delete(key.as_ref(), value)
    }

    /// All values stored under `key`, ascending. Empty if the key is absent.
    pub fn find(&mut self, key: impl AsRef<[u8]>) -> Result<Vec<i32>> {
        self.tree.find(key.as_ref())
    }

    pub fn contains(&mut self, key: impl AsRef<[u8]>, value: i32) -> Result<bool> {
        self.tree.contains(key.as_ref(), value)
    }

    /// Number of stored records.
    pub fn len(&mut self) -> Result<usize> {
        self.tree.len()
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        self.tree.is_empty()
    }

    pub fn height(&mut self) -> Result<usize> {
        self.tree.height()
    }

    /// Every `(key, value)` record in storage order.
    pub fn scan(&mut self) -> Result<Vec<(Bytes, i32)>> {
        self.tree.scan()
    }

    /// Verifies the tree structure. See [`BPlusTree::check_invariants`].
    pub fn check_invariants(&mut self) -> Result<TreeShape> {
        self.tree.check_invariants()
    }

    pub fn stats(&self) -> PageManagerStats {
        self.tree.stats()
    }

    /// Persists the root id, dirty pages and allocation metadata.
    pub fn flush(&mut self) -> Result<()> {
        write_root(&self.config.root_path(), self.tree.root(), self.config.fsync_enabled)?;
        self.tree.flush()
    }

    /// Writes the root file and shuts the page manager down.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        write_root(&self.config.root_path(), self.tree.root(), self.config.fsync_enabled)?;
        self.tree.shutdown()?;
        self.closed = true;
        info!(data_dir = %self.config.data_dir.display(), root = %self.tree.root(), "store.close");
        Ok(())
    }
}

impl Drop for KvStore {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "store.drop.close_failed");
        }
    }
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore")
            .field("data_dir", &self.config.data_dir)
            .field("root", &self.tree.root())
            .field("closed", &self.closed)
            .finish()
    }
}

fn read_root(path: &Path) -> Result<Option<PageId>> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let raw: [u8; 4] = data.as_slice().try_into().map_err(|_| {
        PagekvError::BTreeCorrupted(format!("root file holds {} bytes, expected 4", data.len()))
    })?;
    Ok(Some(PageId(u32::from_le_bytes(raw))))
}

fn write_root(path: &Path, root: PageId, fsync_enabled: bool) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(&root.0.to_le_bytes())?;
        if fsync_enabled {
            file.sync_all()?;
        }
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}
