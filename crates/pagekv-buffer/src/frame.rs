//! Page manager frames.

use pagekv_common::PageId;

/// Identifier for a slot in the page manager's frame arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub u32);

impl FrameId {
    /// Index of the frame in the arena.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame:{}", self.0)
    }
}

/// A frame in the page manager holding one decoded page.
///
/// Each frame contains:
/// - The page payload, decoded once on load and encoded again on write-back
/// - The id of the page currently held
/// - A dirty flag set by mutable access
///
/// The frame's own id is its index in the arena.
#[derive(Debug)]
pub struct Frame<T> {
    /// The page currently stored in this frame.
    page_id: PageId,
    /// Decoded page.
    page: T,
    /// Whether the page changed since it was last written.
    dirty: bool,
}

impl<T> Frame<T> {
    /// Creates a frame holding `page` for `page_id`.
    pub fn new(page_id: PageId, page: T) -> Self {
        Self {
            page_id,
            page,
            dirty: false,
        }
    }

    /// Returns the page ID currently stored in this frame.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns true if this frame is dirty.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Sets the dirty flag.
    #[inline]
    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Returns the page for reading.
    #[inline]
    pub fn page(&self) -> &T {
        &self.page
    }

    /// Returns the page for writing and marks the frame dirty.
    #[inline]
    pub fn page_mut(&mut self) -> &mut T {
        self.dirty = true;
        &mut self.page
    }

    /// Installs a different page in this frame, returning the previous one.
    ///
    /// The frame starts clean; callers that install a page that never reached
    /// disk must mark it dirty.
    pub fn replace(&mut self, page_id: PageId, page: T) -> T {
        self.page_id = page_id;
        self.dirty = false;
        std::mem::replace(&mut self.page, page)
    }
}
