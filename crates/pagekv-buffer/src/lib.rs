//! Page caching for pagekv.
//!
//! This crate provides the page manager underneath the B+ tree:
//! - Fixed-capacity frame arena holding decoded pages
//! - LRU eviction over an indexed min-heap of access stamps
//! - Free page id pool, smallest id reused first
//! - Dirty page write-back and file truncation at shutdown

mod disk;
mod frame;
mod heap;
mod pool;
mod replacer;

pub use disk::{DiskManager, PageFileMeta};
pub use frame::{Frame, FrameId};
pub use heap::IndexedHeap;
pub use pool::{PageCodec, PageManager, PageManagerConfig, PageManagerStats};
pub use replacer::{LruReplacer, Replacer, STAMP_LIMIT};
