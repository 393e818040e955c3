//! Storage engine for pagekv.
//!
//! This crate provides:
//! - Key hashing and the composite order key
//! - Leaf and internal node types with their page encoding
//! - A disk-resident B+ tree over the page manager
//! - The `KvStore` facade owning the store directory

pub mod btree;
mod store;

pub use btree::{BPlusTree, InternalNode, LeafNode, Node, Record, TreeShape, MAX_TREE_DEPTH};
pub use store::KvStore;
