//! Disk-resident B+ tree mapping string keys to many `i32` values.
//!
//! Records are ordered by a 64-bit order key built from the key's hash and
//! the value:
//!
//! ```text
//! order_key = hash(key) << 32 | (value as u32 ^ 0x8000_0000)
//! ```
//!
//! Distinct keys can share a hash, so leaves keep the full key and lookups
//! compare it after narrowing by order key. Equal order keys may span
//! several leaves; deletes walk right across separators equal to the
//! target until the exact record turns up.
//!
//! ## Node geometry
//!
//! | Node     | Page max | Default capacity | Merge threshold |
//! |----------|----------|------------------|-----------------|
//! | Leaf     | 56       | 48 records       | 16              |
//! | Internal | 341      | 336 children     | 112             |
//!
//! A node splits once it exceeds its capacity and is rebalanced once a
//! non-root node drops below its threshold: borrow from the left sibling,
//! borrow from the right, merge into the left, merge the right in.

mod key;
mod node;
mod tree;

pub use key::{hash_key, hash_of, min_order_key, order_key, value_of, Record, VALUE_BIAS};
pub use node::{InternalNode, LeafNode, Node};
pub use tree::{BPlusTree, TreeShape, MAX_TREE_DEPTH};
