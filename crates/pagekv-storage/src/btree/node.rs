//! B+ tree nodes and their page encoding.
//!
//! Leaf page layout (little endian):
//! ```text
//! +--------------------+ 0
//! | tag: u8 = 0        | 1
//! | count: u16         | 3
//! | next: u32          | 7   (u32::MAX = none)
//! +--------------------+
//! | key_len: u8        |
//! | key: [u8; 64]      |     zero padded
//! | order_key: u64     |     x count
//! +--------------------+
//! ```
//!
//! Internal page layout:
//! ```text
//! +--------------------+ 0
//! | tag: u8 = 1        | 1
//! | count: u16         | 3   (children)
//! +--------------------+
//! | separators: u64    |     x (count - 1)
//! | children: u32      |     x count
//! +--------------------+
//! ```

use super::key::Record;
use bytes::{Buf, BufMut};
use pagekv_buffer::PageCodec;
use pagekv_common::page::{INTERNAL_MAX_CHILDREN, LEAF_MAX_RECORDS};
use pagekv_common::{NodeKind, PageId, PagekvError, Result, MAX_KEY_LEN, PAGE_SIZE};

/// Leaf node: records ordered by order key plus a link to the next leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafNode {
    pub records: Vec<Record>,
    pub next: Option<PageId>,
}

impl LeafNode {
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the first record with order key >= `order_key`.
    #[inline]
    pub fn lower_bound(&self, order_key: u64) -> usize {
        self.records.partition_point(|r| r.order_key() < order_key)
    }

    /// Index of the first record that is exactly `(key, order_key)`.
    pub fn find_exact(&self, key: &[u8], order_key: u64) -> Option<usize> {
        let start = self.lower_bound(order_key);
        self.records[start..]
            .iter()
            .take_while(|r| r.order_key() == order_key)
            .position(|r| r.key() == key)
            .map(|offset| start + offset)
    }

    /// Order key of the first record.
    #[inline]
    pub fn first_order_key(&self) -> Option<u64> {
        self.records.first().map(Record::order_key)
    }

    /// Inserts at the lower bound of the record's order key and returns the index.
    pub fn insert(&mut self, record: Record) -> usize {
        let at = self.lower_bound(record.order_key());
        self.records.insert(at, record);
        at
    }

    /// Moves the records from `at` onwards into a new vector.
    pub fn split_off(&mut self, at: usize) -> Vec<Record> {
        self.records.split_off(at)
    }
}

/// Internal node: `n` children separated by `n - 1` order keys.
///
/// `separators[i]` is the smallest order key under `children[i + 1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InternalNode {
    pub separators: Vec<u64>,
    pub children: Vec<PageId>,
}

impl InternalNode {
    /// Creates a node with two children.
    pub fn with_children(left: PageId, separator: u64, right: PageId) -> Self {
        Self {
            separators: vec![separator],
            children: vec![left, right],
        }
    }

    /// Number of children.
    #[inline]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Branch to descend for `order_key`: the first separator >= it.
    #[inline]
    pub fn branch_for(&self, order_key: u64) -> usize {
        self.separators.partition_point(|&s| s < order_key)
    }

    /// Child at `branch`.
    pub fn child(&self, branch: usize) -> Result<PageId> {
        self.children.get(branch).copied().ok_or_else(|| {
            PagekvError::BTreeCorrupted(format!(
                "branch {branch} out of range for {} children",
                self.children.len()
            ))
        })
    }

    /// Separator at `at`.
    pub fn separator(&self, at: usize) -> Result<u64> {
        self.separators.get(at).copied().ok_or_else(|| {
            PagekvError::BTreeCorrupted(format!(
                "separator {at} out of range for {} separators",
                self.separators.len()
            ))
        })
    }

    /// Overwrites the separator at `at`, returning the old one.
    pub fn replace_separator(&mut self, at: usize, separator: u64) -> Result<u64> {
        let len = self.separators.len();
        let slot = self.separators.get_mut(at).ok_or_else(|| {
            PagekvError::BTreeCorrupted(format!(
                "separator {at} out of range for {len} separators"
            ))
        })?;
        Ok(std::mem::replace(slot, separator))
    }

    /// Inserts `child` at `at` (>= 1) with `separator` in front of it.
    pub fn insert_child(&mut self, at: usize, separator: u64, child: PageId) {
        self.separators.insert(at - 1, separator);
        self.children.insert(at, child);
    }

    /// Removes the child at `at` (>= 1) together with the separator in front of it.
    pub fn remove_child(&mut self, at: usize) {
        self.separators.remove(at - 1);
        self.children.remove(at);
    }

    /// Prepends `child`; `separator` becomes the bound of the old first child.
    pub fn push_front(&mut self, child: PageId, separator: u64) {
        self.children.insert(0, child);
        self.separators.insert(0, separator);
    }

    /// Appends `child` with `separator` in front of it.
    pub fn push_back(&mut self, separator: u64, child: PageId) {
        self.separators.push(separator);
        self.children.push(child);
    }

    /// Removes the first child and the separator after it.
    pub fn pop_front(&mut self) -> Option<(PageId, u64)> {
        if self.children.len() < 2 {
            return None;
        }
        let child = self.children.remove(0);
        let separator = self.separators.remove(0);
        Some((child, separator))
    }

    /// Removes the last child and the separator in front of it.
    pub fn pop_back(&mut self) -> Option<(u64, PageId)> {
        if self.children.len() < 2 {
            return None;
        }
        let separator = self.separators.pop()?;
        let child = self.children.pop()?;
        Some((separator, child))
    }

    /// Appends `other` behind this node, joined by `separator`.
    pub fn append(&mut self, separator: u64, other: InternalNode) {
        self.separators.push(separator);
        self.separators.extend(other.separators);
        self.children.extend(other.children);
    }

    /// Splits off the children from `at` (>= 1) and returns the separator
    /// promoted between the halves along with the right half.
    pub fn split_off(&mut self, at: usize) -> (u64, InternalNode) {
        let children = self.children.split_off(at);
        let mut separators = self.separators.split_off(at - 1);
        let promoted = separators.remove(0);
        (
            promoted,
            InternalNode {
                separators,
                children,
            },
        )
    }
}

/// A decoded tree page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(LeafNode),
    Internal(InternalNode),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Leaf(_) => NodeKind::Leaf,
            Node::Internal(_) => NodeKind::Internal,
        }
    }

    /// Occupancy: records for a leaf, children for an internal node.
    pub fn len(&self) -> usize {
        match self {
            Node::Leaf(leaf) => leaf.len(),
            Node::Internal(internal) => internal.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_leaf(&self, page_id: PageId) -> Result<&LeafNode> {
        match self {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Internal(_) => Err(kind_mismatch(page_id, NodeKind::Leaf)),
        }
    }

    pub fn as_leaf_mut(&mut self, page_id: PageId) -> Result<&mut LeafNode> {
        match self {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Internal(_) => Err(kind_mismatch(page_id, NodeKind::Leaf)),
        }
    }

    pub fn as_internal(&self, page_id: PageId) -> Result<&InternalNode> {
        match self {
            Node::Internal(internal) => Ok(internal),
            Node::Leaf(_) => Err(kind_mismatch(page_id, NodeKind::Internal)),
        }
    }

    pub fn as_internal_mut(&mut self, page_id: PageId) -> Result<&mut InternalNode> {
        match self {
            Node::Internal(internal) => Ok(internal),
            Node::Leaf(_) => Err(kind_mismatch(page_id, NodeKind::Internal)),
        }
    }
}

fn kind_mismatch(page_id: PageId, expected: NodeKind) -> PagekvError {
    PagekvError::BTreeCorrupted(format!("{page_id} is not a {expected:?} node"))
}

impl PageCodec for Node {
    type Kind = NodeKind;

    fn empty(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Leaf => Node::Leaf(LeafNode::default()),
            NodeKind::Internal => Node::Internal(InternalNode::default()),
        }
    }

    /// Nodes are split before they can outgrow their page, so the encoding
    /// always fits.
    fn encode_into(&self, buf: &mut [u8; PAGE_SIZE]) {
        buf.fill(0);
        let mut out = &mut buf[..];
        match self {
            Node::Leaf(leaf) => {
                out.put_u8(NodeKind::Leaf as u8);
                out.put_u16_le(leaf.records.len() as u16);
                out.put_u32_le(PageId::to_raw(leaf.next));
                for record in &leaf.records {
                    out.put_u8(record.key().len() as u8);
                    out.put_slice(record.padded_key());
                    out.put_u64_le(record.order_key());
                }
            }
            Node::Internal(internal) => {
                out.put_u8(NodeKind::Internal as u8);
                out.put_u16_le(internal.children.len() as u16);
                for &separator in &internal.separators {
                    out.put_u64_le(separator);
                }
                for child in &internal.children {
                    out.put_u32_le(child.0);
                }
            }
        }
    }

    fn decode(page_id: PageId, buf: &[u8; PAGE_SIZE]) -> Result<Self> {
        let mut input = &buf[..];
        let tag = input.get_u8();
        let kind = NodeKind::from_u8(tag).ok_or(PagekvError::InvalidNodeType {
            page_id: page_id.0,
            tag,
        })?;

        match kind {
            NodeKind::Leaf => {
                let count = input.get_u16_le() as usize;
                let next = PageId::from_raw(input.get_u32_le());
                if count > LEAF_MAX_RECORDS {
                    return Err(corrupted(page_id, format!("leaf count {count} exceeds page")));
                }

                let mut records = Vec::with_capacity(count);
                for _ in 0..count {
                    let len = input.get_u8() as usize;
                    if len > MAX_KEY_LEN {
                        return Err(corrupted(page_id, format!("key length {len}")));
                    }
                    let mut key = [0u8; MAX_KEY_LEN];
                    input.copy_to_slice(&mut key);
                    let order_key = input.get_u64_le();
                    records.push(Record::new(&key[..len], order_key)?);
                }
                Ok(Node::Leaf(LeafNode { records, next }))
            }
            NodeKind::Internal => {
                let count = input.get_u16_le() as usize;
                if count > INTERNAL_MAX_CHILDREN {
                    return Err(corrupted(
                        page_id,
                        format!("internal count {count} exceeds page"),
                    ));
                }

                let separators = (0..count.saturating_sub(1))
                    .map(|_| input.get_u64_le())
                    .collect();
                let children = (0..count).map(|_| PageId(input.get_u32_le())).collect();
                Ok(Node::Internal(InternalNode {
                    separators,
                    children,
                }))
            }
        }
    }
}

fn corrupted(page_id: PageId, reason: String) -> PagekvError {
    PagekvError::PageCorrupted {
        page_id: page_id.0,
        reason,
    }
}
