//! Page replacement policies for the page manager.

use crate::frame::FrameId;
use crate::heap::IndexedHeap;
use pagekv_common::PageId;
use tracing::debug;

/// Largest recency stamp handed out before the stamps are re-ranked.
pub const STAMP_LIMIT: u32 = 1 << 30;

/// Trait for page replacement algorithms.
///
/// A replacer tracks every resident page together with the frame holding it,
/// so it also serves as the page table.
pub trait Replacer {
    /// Records that `page_id` was accessed in `frame_id`, registering it if new.
    fn record_access(&mut self, page_id: PageId, frame_id: FrameId);

    /// Returns the frame holding `page_id`, if resident.
    fn lookup(&self, page_id: PageId) -> Option<FrameId>;

    /// Returns the page that should be evicted next without removing it.
    fn victim(&self) -> Option<(PageId, FrameId)>;

    /// Stops tracking `page_id` and returns the frame it held.
    fn remove(&mut self, page_id: PageId) -> Option<FrameId>;

    /// Returns the number of tracked pages.
    fn size(&self) -> usize;
}

/// Heap entry: last access stamp plus the frame holding the page.
///
/// Ordered by stamp first, so the heap minimum is the least recently used page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CacheEntry {
    stamp: u32,
    frame_id: FrameId,
}

/// Least-recently-used replacer over an indexed min-heap of access stamps.
///
/// Every access takes the next value of a monotonically increasing counter.
/// When the counter would pass the stamp limit, all entries are re-ranked to
/// `0..n` in their current order and the counter restarts after them.
pub struct LruReplacer {
    /// Resident pages keyed by page id.
    heap: IndexedHeap<CacheEntry>,
    /// Last stamp handed out.
    clock: u32,
    /// Stamp limit that triggers re-ranking.
    limit: u32,
}

impl LruReplacer {
    /// Creates a replacer sized for `capacity` resident pages.
    pub fn new(capacity: usize) -> Self {
        Self::with_limit(capacity, STAMP_LIMIT)
    }

    /// Creates a replacer with a custom stamp limit.
    pub fn with_limit(capacity: usize, limit: u32) -> Self {
        Self {
            heap: IndexedHeap::with_capacity(capacity),
            clock: 0,
            limit: limit.max(1),
        }
    }

    /// Returns the last stamp handed out.
    #[inline]
    pub fn clock(&self) -> u32 {
        self.clock
    }

    /// Forgets every resident page and restarts the clock.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.clock = 0;
    }

    /// Returns resident page ids from least to most recently used.
    pub fn pages_by_recency(&self) -> Vec<PageId> {
        self.heap.clone().into_sorted_keys().into_iter().map(PageId).collect()
    }

    fn next_stamp(&mut self) -> u32 {
        if self.clock >= self.limit {
            self.heap.rerank(|rank, entry| entry.stamp = rank as u32);
            self.clock = self.heap.len().saturating_sub(1) as u32;
            debug!(resident = self.heap.len(), "replacer.rerank");
        }
        self.clock += 1;
        self.clock
    }
}

impl Replacer for LruReplacer {
    fn record_access(&mut self, page_id: PageId, frame_id: FrameId) {
        let stamp = self.next_stamp();
        self.heap.push(page_id.0, CacheEntry { stamp, frame_id });
    }

    fn lookup(&self, page_id: PageId) -> Option<FrameId> {
        self.heap.get(page_id.0).map(|entry| entry.frame_id)
    }

    fn victim(&self) -> Option<(PageId, FrameId)> {
        self.heap
            .peek_min()
            .map(|(page, entry)| (PageId(page), entry.frame_id))
    }

    fn remove(&mut self, page_id: PageId) -> Option<FrameId> {
        self.heap.remove(page_id.0).map(|entry| entry.frame_id)
    }

    fn size(&self) -> usize {
        self.heap.len()
    }
}
