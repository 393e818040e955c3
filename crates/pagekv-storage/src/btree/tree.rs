//! Disk-resident B+ tree keyed by order key.
//!
//! Every node lives in a page owned by the [`PageManager`]. Node views are
//! never held across a call that can evict: splits and merges move owned
//! data out of one page before touching the next, so an oversized node is
//! never encoded.

use super::key::{check_key, hash_key, min_order_key, order_key, Record};
use super::node::{InternalNode, LeafNode, Node};
use bytes::Bytes;
use pagekv_buffer::{PageManager, PageManagerStats};
use pagekv_common::{NodeKind, PageId, PagekvError, Result, TreeConfig};
use tracing::debug;

/// Deepest descent accepted before the tree is reported as corrupted.
pub const MAX_TREE_DEPTH: usize = 64;

/// One level of the current root-to-leaf descent.
#[derive(Debug, Clone, Copy)]
struct PathStep {
    page_id: PageId,
    branch: usize,
}

/// Summary returned by [`BPlusTree::check_invariants`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeShape {
    /// Levels from root to leaves, 1 for a lone leaf root.
    pub height: usize,
    pub leaves: usize,
    pub internals: usize,
    pub records: usize,
}

/// Accumulated state of an invariant walk.
#[derive(Default)]
struct Walk {
    leaf_depth: Option<usize>,
    leaves: Vec<PageId>,
    shape: TreeShape,
}

/// B+ tree of `(key, value)` records.
pub struct BPlusTree {
    pages: PageManager<Node>,
    root: PageId,
    config: TreeConfig,
    /// Descent path of the operation in flight.
    path: Vec<PathStep>,
}

impl BPlusTree {
    /// Creates an empty tree with a fresh leaf root.
    pub fn create(mut pages: PageManager<Node>, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let root = pages.allocate(NodeKind::Leaf)?;
        debug!(root = %root, "btree.create");
        Ok(Self::with_root(pages, root, config))
    }

    /// Opens an existing tree rooted at `root`.
    pub fn open(pages: PageManager<Node>, root: PageId, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        if root.0 >= pages.file_size() || pages.is_free(root) {
            return Err(PagekvError::BTreeCorrupted(format!(
                "root {root} is not an allocated page"
            )));
        }
        debug!(root = %root, file_size = pages.file_size(), "btree.open");
        Ok(Self::with_root(pages, root, config))
    }

    fn with_root(pages: PageManager<Node>, root: PageId, config: TreeConfig) -> Self {
        Self {
            pages,
            root,
            config,
            path: Vec::with_capacity(MAX_TREE_DEPTH),
        }
    }

    #[inline]
    pub fn root(&self) -> PageId {
        self.root
    }

    #[inline]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Underlying page manager.
    #[inline]
    pub fn pages(&self) -> &PageManager<Node> {
        &self.pages
    }

    pub fn stats(&self) -> PageManagerStats {
        self.pages.stats()
    }

    /// Adds one `(key, value)` record. Duplicates are kept.
    pub fn insert(&mut self, key: &[u8], value: i32) -> Result<()> {
        let record = Record::new(key, self.order_key_for(key, value))?;
        self.path.clear();
        self.insert_at(self.root, 0, record)
    }

    /// Removes one record equal to `(key, value)`. Returns false if none exists.
    pub fn delete(&mut self, key: &[u8], value: i32) -> Result<bool> {
        check_key(key)?;
        let order_key = self.order_key_for(key, value);
        self.path.clear();
        self.delete_at(self.root, 0, key, order_key)
    }

    /// All values stored under `key`, ascending.
    pub fn find(&mut self, key: &[u8]) -> Result<Vec<i32>> {
        check_key(key)?;
        let hash = hash_key(key, self.config.hash_mask);
        let mut values = Vec::new();
        self.scan_from(min_order_key(hash), |record| {
            if record.hash() != hash {
                return false;
            }
            if record.key() == key {
                values.push(record.value());
            }
            true
        })?;
        Ok(values)
    }

    /// True if at least one record equals `(key, value)`.
    pub fn contains(&mut self, key: &[u8], value: i32) -> Result<bool> {
        check_key(key)?;
        let target = self.order_key_for(key, value);
        let mut found = false;
        self.scan_from(target, |record| {
            if record.order_key() != target {
                return false;
            }
            found = record.key() == key;
            !found
        })?;
        Ok(found)
    }

    /// Number of records, counted along the leaf chain.
    pub fn len(&mut self) -> Result<usize> {
        let mut count = 0;
        self.scan_from(0, |_| {
            count += 1;
            true
        })?;
        Ok(count)
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        let mut empty = true;
        self.scan_from(0, |_| {
            empty = false;
            false
        })?;
        Ok(empty)
    }

    /// Levels from root to leaf.
    pub fn height(&mut self) -> Result<usize> {
        let mut page_id = self.root;
        for level in 1..=MAX_TREE_DEPTH {
            match self.pages.fetch_ref(page_id)? {
                Node::Leaf(_) => return Ok(level),
                Node::Internal(internal) => page_id = internal.child(0)?,
            }
        }
        Err(depth_exceeded())
    }

    /// Every record in order-key order.
    pub fn scan(&mut self) -> Result<Vec<(Bytes, i32)>> {
        let mut out = Vec::new();
        self.scan_from(0, |record| {
            out.push((Bytes::copy_from_slice(record.key()), record.value()));
            true
        })?;
        Ok(out)
    }

    /// Writes dirty pages and allocation metadata.
    pub fn flush(&mut self) -> Result<()> {
        self.pages.flush_all()
    }

    /// Flushes and closes the page manager.
    pub fn shutdown(&mut self) -> Result<()> {
        self.pages.shutdown()
    }

    fn order_key_for(&self, key: &[u8], value: i32) -> u64 {
        order_key(hash_key(key, self.config.hash_mask), value)
    }

    fn step(&self, level: usize) -> Result<PathStep> {
        self.path.get(level).copied().ok_or_else(|| {
            PagekvError::BTreeCorrupted(format!(
                "no path entry at level {level} of {}",
                self.path.len()
            ))
        })
    }

    fn record_step(&mut self, depth: usize, page_id: PageId, branch: usize) {
        self.path.truncate(depth);
        self.path.push(PathStep { page_id, branch });
    }

    /// Leaf reached by descending toward `order_key`.
    fn descend(&mut self, order_key: u64) -> Result<PageId> {
        let mut page_id = self.root;
        for _ in 0..MAX_TREE_DEPTH {
            match self.pages.fetch_ref(page_id)? {
                Node::Leaf(_) => return Ok(page_id),
                Node::Internal(internal) => {
                    page_id = internal.child(internal.branch_for(order_key))?
                }
            }
        }
        Err(depth_exceeded())
    }

    /// Visits records from the lower bound of `start` along the leaf chain
    /// until `visit` returns false.
    fn scan_from<F>(&mut self, start: u64, mut visit: F) -> Result<()>
    where
        F: FnMut(&Record) -> bool,
    {
        let mut current = Some(self.descend(start)?);
        let mut from_start = true;
        let mut hops = 0u32;
        while let Some(page_id) = current {
            hops += 1;
            if hops > self.pages.file_size() {
                return Err(PagekvError::BTreeCorrupted(
                    "leaf chain does not terminate".to_string(),
                ));
            }
            let leaf = self.pages.fetch_ref(page_id)?.as_leaf(page_id)?;
            let from = if from_start {
                leaf.lower_bound(start)
            } else {
                0
            };
            from_start = false;
            for record in &leaf.records[from..] {
                if !visit(record) {
                    return Ok(());
                }
            }
            current = leaf.next;
        }
        Ok(())
    }

    // Insert

    fn insert_at(&mut self, page_id: PageId, depth: usize, record: Record) -> Result<()> {
        check_depth(depth)?;
        let route = match self.pages.fetch_ref(page_id)? {
            Node::Leaf(_) => None,
            Node::Internal(internal) => {
                let branch = internal.branch_for(record.order_key());
                Some((branch, internal.child(branch)?))
            }
        };

        let Some((branch, child)) = route else {
            let leaf = self.pages.fetch(page_id)?.as_leaf_mut(page_id)?;
            leaf.insert(record);
            if leaf.len() > self.config.leaf_capacity {
                self.split_leaf(page_id, depth)?;
            }
            return Ok(());
        };

        self.record_step(depth, page_id, branch);
        self.insert_at(child, depth + 1, record)?;

        let len = self.pages.fetch_ref(page_id)?.len();
        if len > self.config.internal_capacity {
            self.split_internal(page_id, depth)?;
        }
        Ok(())
    }

    fn split_leaf(&mut self, page_id: PageId, depth: usize) -> Result<()> {
        let (records, next) = {
            let leaf = self.pages.fetch(page_id)?.as_leaf_mut(page_id)?;
            let at = leaf.len() / 2;
            (leaf.split_off(at), leaf.next)
        };
        let separator = records.first().map(Record::order_key).ok_or_else(|| {
            PagekvError::BTreeCorrupted(format!("split of {page_id} left no right half"))
        })?;

        let right = self.pages.allocate(NodeKind::Leaf)?;
        *self.pages.fetch(right)?.as_leaf_mut(right)? = LeafNode { records, next };
        self.pages.fetch(page_id)?.as_leaf_mut(page_id)?.next = Some(right);

        debug!(left = %page_id, right = %right, "btree.split_leaf");
        self.promote(page_id, depth, separator, right)
    }

    fn split_internal(&mut self, page_id: PageId, depth: usize) -> Result<()> {
        let (separator, half) = {
            let node = self.pages.fetch(page_id)?.as_internal_mut(page_id)?;
            let at = node.len() / 2;
            node.split_off(at)
        };

        let right = self.pages.allocate(NodeKind::Internal)?;
        *self.pages.fetch(right)?.as_internal_mut(right)? = half;

        debug!(left = %page_id, right = %right, "btree.split_internal");
        self.promote(page_id, depth, separator, right)
    }

    /// Links `right` into the parent of `left`, growing a new root at depth 0.
    fn promote(&mut self, left: PageId, depth: usize, separator: u64, right: PageId) -> Result<()> {
        if depth == 0 {
            let root = self.pages.allocate(NodeKind::Internal)?;
            *self.pages.fetch(root)?.as_internal_mut(root)? =
                InternalNode::with_children(left, separator, right);
            self.root = root;
            debug!(root = %root, left = %left, right = %right, "btree.root_split");
            return Ok(());
        }

        let parent = self.step(depth - 1)?;
        self.pages
            .fetch(parent.page_id)?
            .as_internal_mut(parent.page_id)?
            .insert_child(parent.branch + 1, separator, right);
        Ok(())
    }

    // Delete

    fn delete_at(
        &mut self,
        page_id: PageId,
        depth: usize,
        key: &[u8],
        order_key: u64,
    ) -> Result<bool> {
        check_depth(depth)?;
        match self.pages.fetch_ref(page_id)?.kind() {
            NodeKind::Leaf => self.delete_from_leaf(page_id, depth, key, order_key),
            NodeKind::Internal => self.delete_from_internal(page_id, depth, key, order_key),
        }
    }

    fn delete_from_leaf(
        &mut self,
        page_id: PageId,
        depth: usize,
        key: &[u8],
        order_key: u64,
    ) -> Result<bool> {
        let Some(index) = self
            .pages
            .fetch_ref(page_id)?
            .as_leaf(page_id)?
            .find_exact(key, order_key)
        else {
            return Ok(false);
        };

        let (first, len) = {
            let leaf = self.pages.fetch(page_id)?.as_leaf_mut(page_id)?;
            leaf.records.remove(index);
            (leaf.first_order_key(), leaf.len())
        };
        if depth == 0 {
            return Ok(true);
        }

        if index == 0 {
            if let Some(first) = first {
                self.update_separator(depth, first)?;
            }
        }
        if len < self.config.leaf_merge_threshold {
            self.rebalance_leaf(page_id, depth)?;
        }
        Ok(true)
    }

    fn delete_from_internal(
        &mut self,
        page_id: PageId,
        depth: usize,
        key: &[u8],
        order_key: u64,
    ) -> Result<bool> {
        let mut branch = self
            .pages
            .fetch_ref(page_id)?
            .as_internal(page_id)?
            .branch_for(order_key);

        // Equal order keys may straddle a separator, so a miss moves right
        // while the next separator still admits the key.
        loop {
            let child = self
                .pages
                .fetch_ref(page_id)?
                .as_internal(page_id)?
                .child(branch)?;
            self.record_step(depth, page_id, branch);
            if self.delete_at(child, depth + 1, key, order_key)? {
                break;
            }

            let node = self.pages.fetch_ref(page_id)?.as_internal(page_id)?;
            if branch + 1 >= node.len() || order_key < node.separator(branch)? {
                return Ok(false);
            }
            branch += 1;
        }

        let len = self.pages.fetch_ref(page_id)?.len();
        if depth > 0 {
            if len < self.config.internal_merge_threshold {
                self.rebalance_internal(page_id, depth)?;
            }
        } else if len == 1 {
            self.collapse_root(page_id)?;
        }
        Ok(true)
    }

    /// A leaf lost its first record: the nearest ancestor separator bounding
    /// it from the left takes the leaf's new first key.
    fn update_separator(&mut self, depth: usize, first: u64) -> Result<()> {
        for level in (0..depth).rev() {
            let step = self.step(level)?;
            if step.branch > 0 {
                self.pages
                    .fetch(step.page_id)?
                    .as_internal_mut(step.page_id)?
                    .replace_separator(step.branch - 1, first)?;
                return Ok(());
            }
        }
        Ok(())
    }

    fn collapse_root(&mut self, page_id: PageId) -> Result<()> {
        let child = self
            .pages
            .fetch_ref(page_id)?
            .as_internal(page_id)?
            .child(0)?;
        self.pages.free(page_id)?;
        self.root = child;
        debug!(old_root = %page_id, root = %child, "btree.root_collapse");
        Ok(())
    }

    fn siblings(&mut self, parent: PathStep) -> Result<(Option<PageId>, Option<PageId>)> {
        let node = self
            .pages
            .fetch_ref(parent.page_id)?
            .as_internal(parent.page_id)?;
        let left = match parent.branch {
            0 => None,
            b => Some(node.child(b - 1)?),
        };
        let right = if parent.branch + 1 < node.len() {
            Some(node.child(parent.branch + 1)?)
        } else {
            None
        };
        Ok((left, right))
    }

    fn node_len(&mut self, page_id: PageId) -> Result<usize> {
        Ok(self.pages.fetch_ref(page_id)?.len())
    }

    fn parent_mut(&mut self, parent: PathStep) -> Result<&mut InternalNode> {
        self.pages
            .fetch(parent.page_id)?
            .as_internal_mut(parent.page_id)
    }

    /// Borrows from a sibling above threshold, else merges with one.
    fn rebalance_leaf(&mut self, page_id: PageId, depth: usize) -> Result<()> {
        let parent = self.step(depth - 1)?;
        let (left, right) = self.siblings(parent)?;
        let threshold = self.config.leaf_merge_threshold;

        if let Some(left) = left {
            if self.node_len(left)? > threshold {
                let record = self
                    .pages
                    .fetch(left)?
                    .as_leaf_mut(left)?
                    .records
                    .pop()
                    .ok_or_else(|| empty_sibling(left))?;
                self.pages
                    .fetch(page_id)?
                    .as_leaf_mut(page_id)?
                    .records
                    .insert(0, record);
                self.parent_mut(parent)?
                    .replace_separator(parent.branch - 1, record.order_key())?;
                debug!(leaf = %page_id, from = %left, "btree.borrow_left");
                return Ok(());
            }
        }

        if let Some(right) = right {
            if self.node_len(right)? > threshold {
                let (record, first) = {
                    let sibling = self.pages.fetch(right)?.as_leaf_mut(right)?;
                    let record = sibling.records.remove(0);
                    (record, sibling.first_order_key())
                };
                let first = first.ok_or_else(|| empty_sibling(right))?;
                self.pages
                    .fetch(page_id)?
                    .as_leaf_mut(page_id)?
                    .records
                    .push(record);
                self.parent_mut(parent)?
                    .replace_separator(parent.branch, first)?;
                debug!(leaf = %page_id, from = %right, "btree.borrow_right");
                return Ok(());
            }
        }

        if let Some(left) = left {
            let merged = std::mem::take(self.pages.fetch(page_id)?.as_leaf_mut(page_id)?);
            let target = self.pages.fetch(left)?.as_leaf_mut(left)?;
            target.records.extend(merged.records);
            target.next = merged.next;
            self.pages.free(page_id)?;
            self.parent_mut(parent)?.remove_child(parent.branch);
            debug!(leaf = %page_id, into = %left, "btree.merge_leaf");
        } else if let Some(right) = right {
            let merged = std::mem::take(self.pages.fetch(right)?.as_leaf_mut(right)?);
            let target = self.pages.fetch(page_id)?.as_leaf_mut(page_id)?;
            target.records.extend(merged.records);
            target.next = merged.next;
            self.pages.free(right)?;
            self.parent_mut(parent)?.remove_child(parent.branch + 1);
            debug!(leaf = %right, into = %page_id, "btree.merge_leaf");
        }
        Ok(())
    }

    /// Internal counterpart of [`rebalance_leaf`](Self::rebalance_leaf):
    /// separators rotate through the parent.
    fn rebalance_internal(&mut self, page_id: PageId, depth: usize) -> Result<()> {
        let parent = self.step(depth - 1)?;
        let (left, right) = self.siblings(parent)?;
        let threshold = self.config.internal_merge_threshold;

        if let Some(left) = left {
            if self.node_len(left)? > threshold {
                let (separator, child) = self
                    .pages
                    .fetch(left)?
                    .as_internal_mut(left)?
                    .pop_back()
                    .ok_or_else(|| empty_sibling(left))?;
                let bound = self
                    .parent_mut(parent)?
                    .replace_separator(parent.branch - 1, separator)?;
                self.pages
                    .fetch(page_id)?
                    .as_internal_mut(page_id)?
                    .push_front(child, bound);
                debug!(node = %page_id, from = %left, "btree.borrow_left");
                return Ok(());
            }
        }

        if let Some(right) = right {
            if self.node_len(right)? > threshold {
                let (child, separator) = self
                    .pages
                    .fetch(right)?
                    .as_internal_mut(right)?
                    .pop_front()
                    .ok_or_else(|| empty_sibling(right))?;
                let bound = self
                    .parent_mut(parent)?
                    .replace_separator(parent.branch, separator)?;
                self.pages
                    .fetch(page_id)?
                    .as_internal_mut(page_id)?
                    .push_back(bound, child);
                debug!(node = %page_id, from = %right, "btree.borrow_right");
                return Ok(());
            }
        }

        if let Some(left) = left {
            let merged = std::mem::take(self.pages.fetch(page_id)?.as_internal_mut(page_id)?);
            let bound = self.parent_mut(parent)?.separator(parent.branch - 1)?;
            self.pages
                .fetch(left)?
                .as_internal_mut(left)?
                .append(bound, merged);
            self.pages.free(page_id)?;
            self.parent_mut(parent)?.remove_child(parent.branch);
            debug!(node = %page_id, into = %left, "btree.merge_internal");
        } else if let Some(right) = right {
            let merged = std::mem::take(self.pages.fetch(right)?.as_internal_mut(right)?);
            let bound = self.parent_mut(parent)?.separator(parent.branch)?;
            self.pages
                .fetch(page_id)?
                .as_internal_mut(page_id)?
                .append(bound, merged);
            self.pages.free(right)?;
            self.parent_mut(parent)?.remove_child(parent.branch + 1);
            debug!(node = %right, into = %page_id, "btree.merge_internal");
        }
        Ok(())
    }

    // Verification

    /// Walks the whole tree and checks its structural invariants.
    ///
    /// Verifies uniform leaf depth, node occupancy, separator agreement
    /// with subtree minimums, record ordering and bounds, and that the leaf
    /// chain visits exactly the leaves of the descent in order.
    pub fn check_invariants(&mut self) -> Result<TreeShape> {
        let mut walk = Walk::default();
        self.check_node(self.root, 0, None, None, &mut walk)?;
        self.check_leaf_chain(&walk.leaves)?;

        let mut shape = walk.shape;
        shape.height = walk.leaf_depth.map_or(0, |depth| depth + 1);
        Ok(shape)
    }

    /// Checks the subtree at `page_id` and returns its smallest order key.
    fn check_node(
        &mut self,
        page_id: PageId,
        depth: usize,
        lower: Option<u64>,
        upper: Option<u64>,
        walk: &mut Walk,
    ) -> Result<Option<u64>> {
        check_depth(depth)?;
        let is_root = depth == 0;

        match self.pages.fetch_ref(page_id)?.clone() {
            Node::Leaf(leaf) => {
                let len = leaf.len();
                if len > self.config.leaf_capacity
                    || (!is_root && len < self.config.leaf_merge_threshold)
                {
                    return Err(corrupted(format!("leaf {page_id} holds {len} records")));
                }
                match walk.leaf_depth {
                    None => walk.leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        return Err(corrupted(format!(
                            "leaf {page_id} at depth {depth}, expected {expected}"
                        )));
                    }
                    Some(_) => {}
                }
                if leaf
                    .records
                    .windows(2)
                    .any(|pair| pair[0].order_key() > pair[1].order_key())
                {
                    return Err(corrupted(format!("leaf {page_id} is out of order")));
                }
                for record in &leaf.records {
                    let key = record.order_key();
                    if matches!(lower, Some(lo) if key < lo) || matches!(upper, Some(hi) if key > hi)
                    {
                        return Err(corrupted(format!(
                            "leaf {page_id} holds {record:?} outside its parent bounds"
                        )));
                    }
                }

                walk.leaves.push(page_id);
                walk.shape.leaves += 1;
                walk.shape.records += len;
                Ok(leaf.first_order_key())
            }
            Node::Internal(node) => {
                let len = node.len();
                if (is_root && len < 2)
                    || (!is_root && len < self.config.internal_merge_threshold)
                    || len > self.config.internal_capacity
                {
                    return Err(corrupted(format!("internal {page_id} has {len} children")));
                }
                if node.separators.len() + 1 != len {
                    return Err(corrupted(format!(
                        "internal {page_id} has {} separators for {len} children",
                        node.separators.len()
                    )));
                }
                if node.separators.windows(2).any(|pair| pair[0] > pair[1]) {
                    return Err(corrupted(format!(
                        "internal {page_id} separators are out of order"
                    )));
                }
                walk.shape.internals += 1;

                let mut first = None;
                for (i, &child) in node.children.iter().enumerate() {
                    let lo = if i == 0 { lower } else { Some(node.separators[i - 1]) };
                    let hi = if i + 1 == len { upper } else { Some(node.separators[i]) };
                    let min = self
                        .check_node(child, depth + 1, lo, hi, walk)?
                        .ok_or_else(|| corrupted(format!("empty subtree under {page_id}")))?;
                    if i == 0 {
                        first = Some(min);
                    } else if min != node.separators[i - 1] {
                        return Err(corrupted(format!(
                            "separator {} of {page_id} is {:#x} but its subtree starts at {min:#x}",
                            i - 1,
                            node.separators[i - 1]
                        )));
                    }
                }
                Ok(first)
            }
        }
    }

    fn check_leaf_chain(&mut self, leaves: &[PageId]) -> Result<()> {
        let mut current = leaves.first().copied();
        let mut visited = 0;
        let mut last: Option<u64> = None;

        while let Some(page_id) = current {
            if leaves.get(visited) != Some(&page_id) {
                return Err(corrupted(format!(
                    "leaf chain reaches {page_id} at position {visited}"
                )));
            }
            let leaf = self.pages.fetch_ref(page_id)?.as_leaf(page_id)?;
            if let (Some(prev), Some(first)) = (last, leaf.first_order_key()) {
                if first < prev {
                    return Err(corrupted(format!("leaf chain descends at {page_id}")));
                }
            }
            last = leaf.records.last().map(Record::order_key).or(last);
            current = leaf.next;
            visited += 1;
        }

        if visited != leaves.len() {
            return Err(corrupted(format!(
                "leaf chain ends after {visited} of {} leaves",
                leaves.len()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for BPlusTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BPlusTree")
            .field("root", &self.root)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn check_depth(depth: usize) -> Result<()> {
    if depth >= MAX_TREE_DEPTH {
        return Err(depth_exceeded());
    }
    Ok(())
}

fn depth_exceeded() -> PagekvError {
    corrupted(format!("tree deeper than {MAX_TREE_DEPTH} levels"))
}

fn empty_sibling(page_id: PageId) -> PagekvError {
    corrupted(format!("sibling {page_id} has nothing to lend"))
}

fn corrupted(message: String) -> PagekvError {
    PagekvError::BTreeCorrupted(message)
}
