//! Page identifiers and on-disk page geometry.

use serde::{Deserialize, Serialize};

/// Page size in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Maximum key length in bytes.
pub const MAX_KEY_LEN: usize = 64;

/// Leaf layout: tag (1) + count (2) + next leaf (4).
pub const LEAF_HEADER_SIZE: usize = 7;

/// Record layout: key length (1) + zero padded key (64) + order key (8).
pub const RECORD_SIZE: usize = 1 + MAX_KEY_LEN + 8;

/// Internal layout: tag (1) + child count (2).
pub const INTERNAL_HEADER_SIZE: usize = 3;

/// Encoded separator size.
pub const SEPARATOR_SIZE: usize = 8;

/// Encoded child pointer size.
pub const CHILD_SIZE: usize = 4;

/// Most records a leaf page can hold.
pub const LEAF_MAX_RECORDS: usize = (PAGE_SIZE - LEAF_HEADER_SIZE) / RECORD_SIZE;

/// Most children an internal page can hold.
/// n children need n - 1 separators: HEADER + (n - 1) * 8 + n * 4 <= PAGE_SIZE.
pub const INTERNAL_MAX_CHILDREN: usize =
    (PAGE_SIZE - INTERNAL_HEADER_SIZE + SEPARATOR_SIZE) / (SEPARATOR_SIZE + CHILD_SIZE);

/// Identifier of a page within the page file.
///
/// The id is the page's block index, so its byte offset is `id * PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageId(pub u32);

impl PageId {
    /// Sentinel used on disk for "no page".
    pub const NONE: PageId = PageId(u32::MAX);

    /// Byte offset of this page in the page file.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.0 as u64 * PAGE_SIZE as u64
    }

    /// Decodes the on-disk sentinel into an `Option`.
    #[inline]
    pub fn from_raw(raw: u32) -> Option<PageId> {
        if raw == u32::MAX {
            None
        } else {
            Some(PageId(raw))
        }
    }

    /// Encodes an optional page id with the on-disk sentinel.
    #[inline]
    pub fn to_raw(page_id: Option<PageId>) -> u32 {
        page_id.unwrap_or(Self::NONE).0
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page:{}", self.0)
    }
}

/// Node kind tag stored in the first byte of every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeKind {
    /// Leaf holding records.
    #[default]
    Leaf = 0,
    /// Internal node holding separators and children.
    Internal = 1,
}

impl NodeKind {
    /// Parses a tag byte.
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(NodeKind::Leaf),
            1 => Some(NodeKind::Internal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_geometry() {
        assert_eq!(PAGE_SIZE, 4096);
        assert_eq!(RECORD_SIZE, 73);
        assert_eq!(LEAF_MAX_RECORDS, 56);
        assert_eq!(INTERNAL_MAX_CHILDREN, 341);

        // Full nodes must fit their page.
        assert!(LEAF_HEADER_SIZE + LEAF_MAX_RECORDS * RECORD_SIZE <= PAGE_SIZE);
        assert!(
            INTERNAL_HEADER_SIZE
                + (INTERNAL_MAX_CHILDREN - 1) * SEPARATOR_SIZE
                + INTERNAL_MAX_CHILDREN * CHILD_SIZE
                <= PAGE_SIZE
        );
    }

    #[test]
    fn test_page_id_offset() {
        assert_eq!(PageId(0).offset(), 0);
        assert_eq!(PageId(3).offset(), 3 * 4096);
        assert_eq!(PageId(u32::MAX - 1).offset(), (u32::MAX as u64 - 1) * 4096);
    }

    #[test]
    fn test_page_id_raw_sentinel() {
        assert_eq!(PageId::from_raw(u32::MAX), None);
        assert_eq!(PageId::from_raw(5), Some(PageId(5)));
        assert_eq!(PageId::to_raw(None), u32::MAX);
        assert_eq!(PageId::to_raw(Some(PageId(9))), 9);
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(PageId(42).to_string(), "page:42");
    }

    #[test]
    fn test_node_kind_tags() {
        assert_eq!(NodeKind::Leaf as u8, 0);
        assert_eq!(NodeKind::Internal as u8, 1);
        assert_eq!(NodeKind::from_u8(0), Some(NodeKind::Leaf));
        assert_eq!(NodeKind::from_u8(1), Some(NodeKind::Internal));
        assert_eq!(NodeKind::from_u8(2), None);
        assert_eq!(NodeKind::default(), NodeKind::Leaf);
    }

    #[test]
    fn test_page_id_serde_roundtrip() {
        let original = PageId(500);
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: PageId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(original, deserialized);
    }
}
