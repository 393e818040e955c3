//! Page manager: a fixed arena of decoded pages over a growing page file.

use crate::disk::{DiskManager, PageFileMeta};
use crate::frame::{Frame, FrameId};
use crate::heap::IndexedHeap;
use crate::replacer::{LruReplacer, Replacer};
use pagekv_common::page::{PageId, PAGE_SIZE};
use pagekv_common::{PagekvError, Result};
use std::fmt::Debug;
use std::path::PathBuf;
use tracing::{debug, warn};

/// A page payload that can live in a page manager frame.
pub trait PageCodec: Sized {
    /// Kind selector for freshly allocated pages.
    type Kind: Copy + Debug + Default;

    /// Returns an empty page of the given kind.
    fn empty(kind: Self::Kind) -> Self;

    /// Serializes the page into a full page buffer.
    fn encode_into(&self, buf: &mut [u8; PAGE_SIZE]);

    /// Deserializes a page read from disk.
    fn decode(page_id: PageId, buf: &[u8; PAGE_SIZE]) -> Result<Self>;
}

/// Configuration for the page manager.
#[derive(Debug, Clone)]
pub struct PageManagerConfig {
    /// Number of frames in the arena.
    pub capacity: usize,
    /// Page file path.
    pub data_path: PathBuf,
    /// Metadata file path (file size and free page ids).
    pub meta_path: PathBuf,
    /// Enable fsync on flush and shutdown.
    pub fsync_enabled: bool,
}

impl PageManagerConfig {
    /// Creates a configuration with fsync enabled.
    pub fn new(
        capacity: usize,
        data_path: impl Into<PathBuf>,
        meta_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            capacity,
            data_path: data_path.into(),
            meta_path: meta_path.into(),
            fsync_enabled: true,
        }
    }
}

/// Point-in-time page manager counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageManagerStats {
    /// Pages currently held in frames.
    pub resident: usize,
    /// Number of frames in the arena.
    pub capacity: usize,
    /// Next never-used page id.
    pub file_size: u32,
    /// Page ids waiting for reuse.
    pub free_ids: usize,
    /// Fetches served from a frame.
    pub hits: u64,
    /// Fetches that loaded from disk.
    pub misses: u64,
    /// Pages pushed out of the arena to make room.
    pub evictions: u64,
    /// Pages written to disk.
    pub writes: u64,
}

/// Page manager.
///
/// Manages a fixed-size arena of page frames with:
/// - Page id to frame mapping and LRU eviction through [`LruReplacer`]
/// - A min-heap of freed page ids, smallest reused first
/// - Write-back of dirty pages on eviction, flush and shutdown
///
/// Views returned by [`fetch`](Self::fetch) borrow the manager mutably, so no
/// view can outlive the next call that might evict it.
pub struct PageManager<T: PageCodec> {
    /// Configuration.
    config: PageManagerConfig,
    /// Frame arena, filled lazily up to capacity.
    frames: Vec<Frame<T>>,
    /// Resident pages and eviction order.
    replacer: LruReplacer,
    /// Freed page ids.
    free_ids: IndexedHeap<u32>,
    /// Next never-used page id.
    file_size: u32,
    /// Page file.
    disk: DiskManager,
    /// Encode/decode buffer.
    scratch: Box<[u8; PAGE_SIZE]>,
    /// Running counters.
    stats: PageManagerStats,
    /// Set once shutdown completes.
    closed: bool,
}

impl<T: PageCodec> PageManager<T> {
    /// Opens the page file and metadata, starting empty if they are missing.
    pub fn open(config: PageManagerConfig) -> Result<Self> {
        if config.capacity == 0 {
            return Err(PagekvError::ConfigError(
                "page manager capacity must be at least 1".to_string(),
            ));
        }

        let disk = DiskManager::open(&config.data_path, config.fsync_enabled)?;
        let meta = PageFileMeta::load(&config.meta_path)?.unwrap_or_default();

        let mut free_ids = IndexedHeap::with_capacity(meta.free_ids.len());
        for id in meta.free_ids {
            if id < meta.file_size {
                free_ids.push(id, id);
            }
        }

        debug!(
            path = %config.data_path.display(),
            file_size = meta.file_size,
            free = free_ids.len(),
            capacity = config.capacity,
            "pager.open"
        );

        Ok(Self {
            frames: Vec::with_capacity(config.capacity),
            replacer: LruReplacer::new(config.capacity),
            free_ids,
            file_size: meta.file_size,
            disk,
            scratch: Box::new([0u8; PAGE_SIZE]),
            stats: PageManagerStats::default(),
            closed: false,
            config,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PageManagerConfig {
        &self.config
    }

    /// Returns the next never-used page id.
    #[inline]
    pub fn file_size(&self) -> u32 {
        self.file_size
    }

    /// Returns the number of frames in the arena.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Returns the number of resident pages.
    #[inline]
    pub fn resident_count(&self) -> usize {
        self.replacer.size()
    }

    /// Checks if a page is held in a frame.
    pub fn is_resident(&self, page_id: PageId) -> bool {
        self.replacer.lookup(page_id).is_some()
    }

    /// Checks if a page id is waiting in the free pool.
    pub fn is_free(&self, page_id: PageId) -> bool {
        self.free_ids.contains(page_id.0)
    }

    /// Returns the free page ids, ascending.
    pub fn free_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.free_ids.iter().map(|(id, _)| id).collect();
        ids.sort_unstable();
        ids
    }

    /// Returns current counters.
    pub fn stats(&self) -> PageManagerStats {
        PageManagerStats {
            resident: self.replacer.size(),
            capacity: self.config.capacity,
            file_size: self.file_size,
            free_ids: self.free_ids.len(),
            ..self.stats
        }
    }

    /// Returns a mutable view of a page, loading it if needed.
    ///
    /// The page is marked dirty and becomes the most recently used.
    pub fn fetch(&mut self, page_id: PageId) -> Result<&mut T> {
        let frame_id = self.resolve(page_id)?;
        Ok(self.frames[frame_id.index()].page_mut())
    }

    /// Returns a read-only view of a page, loading it if needed.
    ///
    /// Unlike [`fetch`](Self::fetch) this leaves the dirty flag alone.
    pub fn fetch_ref(&mut self, page_id: PageId) -> Result<&T> {
        let frame_id = self.resolve(page_id)?;
        Ok(self.frames[frame_id.index()].page())
    }

    /// Allocates a page id and installs an empty page of `kind` for it.
    ///
    /// The smallest freed id is reused first, otherwise the file grows by one.
    /// Nothing is read from disk.
    pub fn allocate(&mut self, kind: T::Kind) -> Result<PageId> {
        self.ensure_open()?;

        let recycled = self.free_ids.peek_min().map(|(id, _)| id);
        let page_id = match recycled {
            Some(id) => PageId(id),
            None if self.file_size == PageId::NONE.0 => {
                return Err(PagekvError::Internal("page id space exhausted".to_string()));
            }
            None => PageId(self.file_size),
        };

        let page = T::empty(kind);
        let frame_id = match self.replacer.lookup(page_id) {
            // Freed but still cached: reuse its frame.
            Some(frame_id) => {
                self.frames[frame_id.index()].replace(page_id, page);
                frame_id
            }
            None => self.claim_frame(page_id, page)?,
        };

        // Commit the id only once a frame holds the page.
        match recycled {
            Some(id) => {
                self.free_ids.remove(id);
            }
            None => self.file_size += 1,
        }
        self.frames[frame_id.index()].set_dirty(true);
        self.replacer.record_access(page_id, frame_id);

        debug!(
            page = %page_id,
            frame = %frame_id,
            ?kind,
            recycled = recycled.is_some(),
            "pager.allocate"
        );
        Ok(page_id)
    }

    /// Returns a page id to the free pool. The page stays cached until evicted.
    pub fn free(&mut self, page_id: PageId) -> Result<()> {
        self.ensure_open()?;
        if page_id.0 >= self.file_size {
            return Err(PagekvError::Internal(format!(
                "cannot free {page_id}: file size is {}",
                self.file_size
            )));
        }
        self.free_ids.push(page_id.0, page_id.0);
        debug!(page = %page_id, "pager.free");
        Ok(())
    }

    /// Writes dirty pages and the metadata without shutting down.
    pub fn flush_all(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.store_meta()?;
        let written = self.write_dirty_pages()?;
        self.disk.sync()?;
        debug!(written, file_size = self.file_size, "pager.flush_all");
        Ok(())
    }

    /// Persists everything and releases the arena.
    ///
    /// Free ids forming a suffix of the file are dropped and the file is
    /// truncated to the remaining size. Calling this again is a no-op.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        while self.file_size > 0 && self.free_ids.remove(self.file_size - 1).is_some() {
            self.file_size -= 1;
        }

        self.store_meta()?;
        let written = self.write_dirty_pages()?;
        self.disk.truncate(self.file_size)?;
        self.disk.sync()?;

        self.frames.clear();
        self.replacer.clear();
        self.closed = true;

        debug!(
            written,
            file_size = self.file_size,
            free = self.free_ids.len(),
            "pager.shutdown"
        );
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(PagekvError::Internal("page manager is shut down".to_string()));
        }
        Ok(())
    }

    /// Returns the frame holding `page_id`, loading the page on a miss.
    fn resolve(&mut self, page_id: PageId) -> Result<FrameId> {
        self.ensure_open()?;

        if let Some(frame_id) = self.replacer.lookup(page_id) {
            self.stats.hits += 1;
            self.replacer.record_access(page_id, frame_id);
            return Ok(frame_id);
        }

        self.stats.misses += 1;
        let page = if self.disk.read_page(page_id, &mut self.scratch)? {
            T::decode(page_id, &self.scratch)?
        } else {
            T::empty(T::Kind::default())
        };

        let frame_id = self.claim_frame(page_id, page)?;
        self.replacer.record_access(page_id, frame_id);
        Ok(frame_id)
    }

    /// Places `page` in an unused frame, or in the frame of the LRU victim.
    ///
    /// The caller registers the page with the replacer.
    fn claim_frame(&mut self, page_id: PageId, page: T) -> Result<FrameId> {
        if self.frames.len() < self.config.capacity {
            let frame_id = FrameId(self.frames.len() as u32);
            self.frames.push(Frame::new(page_id, page));
            return Ok(frame_id);
        }

        let (victim, frame_id) = self.replacer.victim().ok_or(PagekvError::CacheExhausted)?;
        // Write first so a failed write leaves the victim resident.
        self.write_back(frame_id)?;
        self.replacer.remove(victim);
        self.stats.evictions += 1;
        debug!(victim = %victim, frame = %frame_id, page = %page_id, "pager.evict");

        self.frames[frame_id.index()].replace(page_id, page);
        Ok(frame_id)
    }

    /// Writes a frame's page if it is dirty and still allocated.
    fn write_back(&mut self, frame_id: FrameId) -> Result<bool> {
        let index = frame_id.index();
        if !self.frames[index].is_dirty() {
            return Ok(false);
        }

        let page_id = self.frames[index].page_id();
        let live = page_id.0 < self.file_size && !self.free_ids.contains(page_id.0);
        if live {
            self.frames[index].page().encode_into(&mut self.scratch);
            self.disk.write_page(page_id, &self.scratch)?;
            self.stats.writes += 1;
        }
        self.frames[index].set_dirty(false);
        Ok(live)
    }

    fn write_dirty_pages(&mut self) -> Result<usize> {
        let mut written = 0;
        for index in 0..self.frames.len() {
            if self.write_back(FrameId(index as u32))? {
                written += 1;
            }
        }
        Ok(written)
    }

    fn store_meta(&self) -> Result<()> {
        let meta = PageFileMeta {
            file_size: self.file_size,
            free_ids: self.free_ids(),
        };
        meta.store(&self.config.meta_path, self.config.fsync_enabled)
    }
}

impl<T: PageCodec> Drop for PageManager<T> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(
                error = %e,
                path = %self.config.data_path.display(),
                "pager.drop.shutdown_failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    enum TestKind {
        #[default]
        Plain,
        Marked,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestPage {
        kind: TestKind,
        value: u64,
    }

    impl PageCodec for TestPage {
        type Kind = TestKind;

        fn empty(kind: TestKind) -> Self {
            Self { kind, value: 0 }
        }

        fn encode_into(&self, buf: &mut [u8; PAGE_SIZE]) {
            buf.fill(0);
            buf[0] = match self.kind {
                TestKind::Plain => 0,
                TestKind::Marked => 1,
            };
            buf[1..9].copy_from_slice(&self.value.to_le_bytes());
        }

        fn decode(page_id: PageId, buf: &[u8; PAGE_SIZE]) -> Result<Self> {
            let kind = match buf[0] {
                0 => TestKind::Plain,
                1 => TestKind::Marked,
                tag => {
                    return Err(PagekvError::InvalidNodeType {
                        page_id: page_id.0,
                        tag,
                    })
                }
            };
            let mut value = [0u8; 8];
            value.copy_from_slice(&buf[1..9]);
            Ok(Self {
                kind,
                value: u64::from_le_bytes(value),
            })
        }
    }

    fn config(dir: &TempDir, capacity: usize) -> PageManagerConfig {
        PageManagerConfig {
            fsync_enabled: false,
            ..PageManagerConfig::new(
                capacity,
                dir.path().join("data.bin"),
                dir.path().join("info.bin"),
            )
        }
    }

    fn open(dir: &TempDir, capacity: usize) -> PageManager<TestPage> {
        PageManager::open(config(dir, capacity)).unwrap()
    }

    #[test]
    fn test_page_manager_open_empty() {
        let dir = tempdir().unwrap();
        let pm = open(&dir, 4);

        assert_eq!(pm.file_size(), 0);
        assert_eq!(pm.capacity(), 4);
        assert_eq!(pm.resident_count(), 0);
        assert!(pm.free_ids().is_empty());
    }

    #[test]
    fn test_page_manager_rejects_zero_capacity() {
        let dir = tempdir().unwrap();
        let result = PageManager::<TestPage>::open(config(&dir, 0));
        assert!(matches!(result, Err(PagekvError::ConfigError(_))));
    }

    #[test]
    fn test_page_manager_allocate_sequential() {
        let dir = tempdir().unwrap();
        let mut pm = open(&dir, 4);

        for expected in 0..3 {
            let page_id = pm.allocate(TestKind::Plain).unwrap();
            assert_eq!(page_id, PageId(expected));
        }
        assert_eq!(pm.file_size(), 3);
        assert_eq!(pm.resident_count(), 3);

        let marked = pm.allocate(TestKind::Marked).unwrap();
        assert_eq!(pm.fetch_ref(marked).unwrap(), &TestPage::empty(TestKind::Marked));
    }

    #[test]
    fn test_page_manager_evicts_lru() {
        let dir = tempdir().unwrap();
        let mut pm = open(&dir, 2);

        let a = pm.allocate(TestKind::Plain).unwrap();
        let b = pm.allocate(TestKind::Plain).unwrap();
        pm.fetch_ref(a).unwrap();

        // b is now least recent.
        let c = pm.allocate(TestKind::Plain).unwrap();
        assert!(pm.is_resident(a));
        assert!(!pm.is_resident(b));
        assert!(pm.is_resident(c));
        assert_eq!(pm.stats().evictions, 1);
    }

    #[test]
    fn test_page_manager_content_survives_eviction() {
        let dir = tempdir().unwrap();
        let mut pm = open(&dir, 2);

        let ids: Vec<PageId> = (0..6)
            .map(|i| {
                let id = pm.allocate(TestKind::Plain).unwrap();
                pm.fetch(id).unwrap().value = i * 10;
                id
            })
            .collect();

        for (i, &id) in ids.iter().enumerate() {
            assert_eq!(pm.fetch_ref(id).unwrap().value, i as u64 * 10);
        }

        let stats = pm.stats();
        assert_eq!(stats.resident, 2);
        assert!(stats.evictions >= 4);
        assert!(stats.writes >= 4);
        assert!(stats.misses >= 4);
    }

    #[test]
    fn test_page_manager_fetch_hits_and_misses() {
        let dir = tempdir().unwrap();
        let mut pm = open(&dir, 1);

        let a = pm.allocate(TestKind::Plain).unwrap();
        pm.fetch(a).unwrap().value = 1;
        pm.fetch(a).unwrap();
        assert_eq!(pm.stats().hits, 2);

        let b = pm.allocate(TestKind::Plain).unwrap();
        pm.fetch_ref(a).unwrap();
        assert_eq!(pm.stats().misses, 1);
        assert!(!pm.is_resident(b));
    }

    #[test]
    fn test_page_manager_fetch_past_end_is_empty() {
        let dir = tempdir().unwrap();
        let mut pm = open(&dir, 2);

        let page = pm.fetch_ref(PageId(9)).unwrap();
        assert_eq!(page, &TestPage::empty(TestKind::default()));
    }

    #[test]
    fn test_page_manager_reuses_smallest_free_id() {
        let dir = tempdir().unwrap();
        let mut pm = open(&dir, 8);

        for _ in 0..5 {
            pm.allocate(TestKind::Plain).unwrap();
        }
        pm.free(PageId(3)).unwrap();
        pm.free(PageId(1)).unwrap();
        assert!(pm.is_free(PageId(1)));
        assert_eq!(pm.free_ids(), vec![1, 3]);

        assert_eq!(pm.allocate(TestKind::Plain).unwrap(), PageId(1));
        assert_eq!(pm.allocate(TestKind::Plain).unwrap(), PageId(3));
        assert_eq!(pm.allocate(TestKind::Plain).unwrap(), PageId(5));
        assert_eq!(pm.file_size(), 6);
    }

    #[test]
    fn test_page_manager_free_unallocated_fails() {
        let dir = tempdir().unwrap();
        let mut pm = open(&dir, 2);
        pm.allocate(TestKind::Plain).unwrap();

        assert!(pm.free(PageId(4)).is_err());
    }

    #[test]
    fn test_page_manager_reallocate_resident_free_page_in_place() {
        let dir = tempdir().unwrap();
        let mut pm = open(&dir, 2);

        let a = pm.allocate(TestKind::Plain).unwrap();
        let b = pm.allocate(TestKind::Plain).unwrap();
        pm.fetch(a).unwrap().value = 77;
        pm.free(a).unwrap();

        let again = pm.allocate(TestKind::Marked).unwrap();
        assert_eq!(again, a);
        assert_eq!(pm.resident_count(), 2);
        assert!(pm.is_resident(b));
        assert_eq!(pm.stats().evictions, 0);
        assert_eq!(pm.fetch_ref(a).unwrap(), &TestPage::empty(TestKind::Marked));
    }

    #[test]
    fn test_page_manager_fetch_ref_does_not_dirty() {
        let dir = tempdir().unwrap();
        let mut pm = open(&dir, 4);

        let a = pm.allocate(TestKind::Plain).unwrap();
        pm.flush_all().unwrap();
        let writes = pm.stats().writes;
        assert_eq!(writes, 1);

        pm.fetch_ref(a).unwrap();
        pm.flush_all().unwrap();
        assert_eq!(pm.stats().writes, writes);

        pm.fetch(a).unwrap().value = 3;
        pm.flush_all().unwrap();
        assert_eq!(pm.stats().writes, writes + 1);
    }

    #[test]
    fn test_page_manager_freed_page_not_written() {
        let dir = tempdir().unwrap();
        let mut pm = open(&dir, 1);

        let a = pm.allocate(TestKind::Plain).unwrap();
        pm.free(a).unwrap();
        // Evicting the dead page must not write it.
        pm.fetch_ref(PageId(5)).unwrap();
        assert_eq!(pm.stats().evictions, 1);
        assert_eq!(pm.stats().writes, 0);
    }

    #[test]
    fn test_page_manager_persistence() {
        let dir = tempdir().unwrap();
        {
            let mut pm = open(&dir, 2);
            for i in 0..5u64 {
                let id = pm.allocate(TestKind::Marked).unwrap();
                pm.fetch(id).unwrap().value = 100 + i;
            }
            pm.shutdown().unwrap();
        }

        let mut pm = open(&dir, 1);
        assert_eq!(pm.file_size(), 5);
        for i in 0..5u32 {
            let page = pm.fetch_ref(PageId(i)).unwrap();
            assert_eq!(page.kind, TestKind::Marked);
            assert_eq!(page.value, 100 + i as u64);
        }
    }

    #[test]
    fn test_page_manager_shutdown_trims_free_suffix() {
        let dir = tempdir().unwrap();
        {
            let mut pm = open(&dir, 8);
            for _ in 0..5 {
                pm.allocate(TestKind::Plain).unwrap();
            }
            pm.free(PageId(4)).unwrap();
            pm.free(PageId(1)).unwrap();
            pm.free(PageId(3)).unwrap();
            pm.shutdown().unwrap();
            assert_eq!(pm.file_size(), 3);
        }

        let len = std::fs::metadata(dir.path().join("data.bin")).unwrap().len();
        assert_eq!(len, 3 * PAGE_SIZE as u64);

        let meta = PageFileMeta::load(&dir.path().join("info.bin")).unwrap().unwrap();
        assert_eq!(meta.file_size, 3);
        assert_eq!(meta.free_ids, vec![1]);

        let mut pm = open(&dir, 8);
        assert_eq!(pm.free_ids(), vec![1]);
        assert_eq!(pm.allocate(TestKind::Plain).unwrap(), PageId(1));
        assert_eq!(pm.allocate(TestKind::Plain).unwrap(), PageId(3));
    }

    #[test]
    fn test_page_manager_shutdown_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut pm = open(&dir, 2);
        pm.allocate(TestKind::Plain).unwrap();

        pm.shutdown().unwrap();
        pm.shutdown().unwrap();
        assert_eq!(pm.resident_count(), 0);
        assert_eq!(pm.stats().resident, 0);
        assert!(pm.fetch(PageId(0)).is_err());
        assert!(pm.allocate(TestKind::Plain).is_err());
    }

    #[test]
    fn test_page_manager_drop_persists() {
        let dir = tempdir().unwrap();
        {
            let mut pm = open(&dir, 2);
            let id = pm.allocate(TestKind::Plain).unwrap();
            pm.fetch(id).unwrap().value = 42;
        }

        let mut pm = open(&dir, 2);
        assert_eq!(pm.fetch_ref(PageId(0)).unwrap().value, 42);
    }

    #[test]
    fn test_page_manager_decode_error_propagates() {
        let dir = tempdir().unwrap();
        {
            let mut disk = DiskManager::open(dir.path().join("data.bin"), false).unwrap();
            let mut bad = Box::new([0u8; PAGE_SIZE]);
            bad[0] = 7;
            disk.write_page(PageId(0), &bad).unwrap();
            PageFileMeta {
                file_size: 1,
                free_ids: vec![],
            }
            .store(&dir.path().join("info.bin"), false)
            .unwrap();
        }

        let mut pm = open(&dir, 2);
        let err = pm.fetch(PageId(0)).unwrap_err();
        assert!(matches!(
            err,
            PagekvError::InvalidNodeType { page_id: 0, tag: 7 }
        ));
        assert!(!pm.is_resident(PageId(0)));
    }
}
