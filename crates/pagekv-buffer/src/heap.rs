//! Indexed binary min-heap keyed by integer ids.

/// Binary min-heap of `(key, value)` pairs with a reverse key→slot index.
///
/// Each key appears at most once. Pushing an existing key replaces its value
/// and restores heap order in O(log n), which is what the page cache needs to
/// bump a page's recency stamp. Keys are dense page ids, so the reverse index
/// is a plain vector indexed by key.
#[derive(Debug, Clone)]
pub struct IndexedHeap<V> {
    /// Heap-ordered entries.
    entries: Vec<(u32, V)>,
    /// Position of each key in `entries`.
    slots: Vec<Option<usize>>,
}

impl<V: Ord + Copy> IndexedHeap<V> {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// Creates an empty heap with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the heap is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if `key` is in the heap.
    #[inline]
    pub fn contains(&self, key: u32) -> bool {
        self.slot_of(key).is_some()
    }

    /// Returns the value stored for `key`.
    #[inline]
    pub fn get(&self, key: u32) -> Option<V> {
        self.slot_of(key).map(|slot| self.entries[slot].1)
    }

    /// Returns the minimum entry without removing it.
    #[inline]
    pub fn peek_min(&self) -> Option<(u32, V)> {
        self.entries.first().copied()
    }

    /// Inserts `key`, or replaces its value if already present.
    pub fn push(&mut self, key: u32, value: V) {
        match self.slot_of(key) {
            Some(slot) => {
                let old = self.entries[slot].1;
                self.entries[slot].1 = value;
                if value < old {
                    self.sift_up(slot);
                } else if old < value {
                    self.sift_down(slot);
                }
            }
            None => {
                let index = key as usize;
                if index >= self.slots.len() {
                    self.slots.resize(index + 1, None);
                }
                let slot = self.entries.len();
                self.entries.push((key, value));
                self.slots[index] = Some(slot);
                self.sift_up(slot);
            }
        }
    }

    /// Removes and returns the minimum entry.
    pub fn pop_min(&mut self) -> Option<(u32, V)> {
        self.remove_slot(0)
    }

    /// Removes `key` and returns its value.
    pub fn remove(&mut self, key: u32) -> Option<V> {
        let slot = self.slot_of(key)?;
        self.remove_slot(slot).map(|(_, value)| value)
    }

    /// Iterates over entries in heap (not sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, V)> + '_ {
        self.entries.iter().copied()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.slots.clear();
    }

    /// Consumes the heap and returns its keys ordered by value.
    pub fn into_sorted_keys(mut self) -> Vec<u32> {
        self.entries.sort_by(|a, b| a.1.cmp(&b.1));
        self.entries.into_iter().map(|(key, _)| key).collect()
    }

    /// Sorts entries by value and lets `assign` rewrite each value with its rank.
    ///
    /// A sorted array is a valid min-heap, so heap order holds afterwards as long
    /// as `assign` is monotonic in rank.
    pub fn rerank<F>(&mut self, mut assign: F)
    where
        F: FnMut(usize, &mut V),
    {
        self.entries.sort_by(|a, b| a.1.cmp(&b.1));
        for (rank, entry) in self.entries.iter_mut().enumerate() {
            assign(rank, &mut entry.1);
        }
        for (slot, &(key, _)) in self.entries.iter().enumerate() {
            self.slots[key as usize] = Some(slot);
        }
    }

    #[inline]
    fn slot_of(&self, key: u32) -> Option<usize> {
        self.slots.get(key as usize).copied().flatten()
    }

    fn remove_slot(&mut self, slot: usize) -> Option<(u32, V)> {
        if slot >= self.entries.len() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.swap(slot, last);
        let removed = self.entries.pop()?;
        self.slots[removed.0 as usize] = None;

        if slot < self.entries.len() {
            // The moved entry may belong above or below its new slot.
            self.sift_up(slot);
            self.sift_down(slot);
        }
        Some(removed)
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.entries.swap(a, b);
        self.slots[self.entries[a].0 as usize] = Some(a);
        self.slots[self.entries[b].0 as usize] = Some(b);
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.entries[index].1 >= self.entries[parent].1 {
                break;
            }
            self.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;

            if left < len && self.entries[left].1 < self.entries[smallest].1 {
                smallest = left;
            }
            if right < len && self.entries[right].1 < self.entries[smallest].1 {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.swap(index, smallest);
            index = smallest;
        }
    }
}

impl<V: Ord + Copy> Default for IndexedHeap<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn drain(heap: &mut IndexedHeap<u64>) -> Vec<(u32, u64)> {
        let mut out = Vec::new();
        while let Some(entry) = heap.pop_min() {
            out.push(entry);
        }
        out
    }

    #[test]
    fn test_heap_new_is_empty() {
        let heap: IndexedHeap<u64> = IndexedHeap::new();
        assert!(heap.is_empty());
        assert_eq!(heap.len(), 0);
        assert!(heap.peek_min().is_none());
        assert!(!heap.contains(0));
    }

    #[test]
    fn test_heap_pops_in_value_order() {
        let mut heap = IndexedHeap::new();
        let mut keys: Vec<u32> = (0..200).collect();
        keys.shuffle(&mut StdRng::seed_from_u64(7));

        for &key in &keys {
            heap.push(key, 1000 - key as u64);
        }
        assert_eq!(heap.len(), 200);

        let popped = drain(&mut heap);
        let values: Vec<u64> = popped.iter().map(|(_, v)| *v).collect();
        let mut sorted = values.clone();
        sorted.sort();
        assert_eq!(values, sorted);
        assert_eq!(popped[0], (199, 801));
        assert!(heap.is_empty());
    }

    #[test]
    fn test_heap_push_existing_key_increases_value() {
        let mut heap = IndexedHeap::new();
        heap.push(1, 10u64);
        heap.push(2, 20);
        heap.push(3, 30);

        // Bumping the minimum sends it to the bottom.
        heap.push(1, 40);
        assert_eq!(heap.len(), 3);
        assert_eq!(heap.get(1), Some(40));
        assert_eq!(drain(&mut heap), vec![(2, 20), (3, 30), (1, 40)]);
    }

    #[test]
    fn test_heap_push_existing_key_decreases_value() {
        let mut heap = IndexedHeap::new();
        heap.push(1, 10u64);
        heap.push(2, 20);
        heap.push(3, 30);

        heap.push(3, 5);
        assert_eq!(heap.peek_min(), Some((3, 5)));
        assert_eq!(drain(&mut heap), vec![(3, 5), (1, 10), (2, 20)]);
    }

    #[test]
    fn test_heap_pop_clears_membership() {
        let mut heap = IndexedHeap::new();
        heap.push(4, 1u64);
        heap.push(9, 2);

        assert_eq!(heap.pop_min(), Some((4, 1)));
        assert!(!heap.contains(4));
        assert!(heap.contains(9));
        assert_eq!(heap.get(4), None);

        // The key can come back after being popped.
        heap.push(4, 0);
        assert_eq!(heap.peek_min(), Some((4, 0)));
    }

    #[test]
    fn test_heap_remove_arbitrary_key() {
        let mut heap = IndexedHeap::new();
        for key in 0..10u32 {
            heap.push(key, key as u64 * 3);
        }

        assert_eq!(heap.remove(5), Some(15));
        assert_eq!(heap.remove(5), None);
        assert_eq!(heap.remove(100), None);
        assert_eq!(heap.len(), 9);

        let keys: Vec<u32> = drain(&mut heap).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![0, 1, 2, 3, 4, 6, 7, 8, 9]);
    }

    #[test]
    fn test_heap_as_free_id_pool() {
        let mut pool: IndexedHeap<u32> = IndexedHeap::new();
        for id in [12u32, 3, 7, 5] {
            pool.push(id, id);
        }
        assert_eq!(pool.pop_min(), Some((3, 3)));
        assert_eq!(pool.pop_min(), Some((5, 5)));
        assert_eq!(pool.into_sorted_keys(), vec![7, 12]);
    }

    #[test]
    fn test_heap_iter_and_clear() {
        let mut heap = IndexedHeap::new();
        for (key, value) in [(4u32, 40u64), (1, 10), (9, 90)] {
            heap.push(key, value);
        }
        let mut entries: Vec<(u32, u64)> = heap.iter().collect();
        entries.sort_unstable();
        assert_eq!(entries, vec![(1, 10), (4, 40), (9, 90)]);

        heap.clear();
        assert!(heap.is_empty());
        assert_eq!(heap.get(4), None);
        assert_eq!(heap.iter().count(), 0);

        heap.push(4, 7);
        assert_eq!(heap.peek_min(), Some((4, 7)));
    }

    #[test]
    fn test_heap_rerank_preserves_order() {
        let mut heap = IndexedHeap::new();
        heap.push(8, 1_000_000u64);
        heap.push(2, 10);
        heap.push(5, 999);
        heap.push(1, 50_000);

        heap.rerank(|rank, value| *value = rank as u64);

        assert_eq!(heap.get(2), Some(0));
        assert_eq!(heap.get(5), Some(1));
        assert_eq!(heap.get(1), Some(2));
        assert_eq!(heap.get(8), Some(3));

        // Reverse index still valid after the rebuild.
        heap.push(2, 100);
        assert_eq!(drain(&mut heap), vec![(5, 1), (1, 2), (8, 3), (2, 100)]);
    }

    #[test]
    fn test_heap_random_updates_match_model() {
        let mut heap = IndexedHeap::new();
        let mut model = std::collections::HashMap::new();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..2_000 {
            let key = rand::Rng::gen_range(&mut rng, 0..64u32);
            let value = rand::Rng::gen_range(&mut rng, 0..10_000u64);
            heap.push(key, value);
            model.insert(key, value);
        }
        for _ in 0..16 {
            let key = rand::Rng::gen_range(&mut rng, 0..64u32);
            assert_eq!(heap.remove(key), model.remove(&key));
        }

        let mut expected: Vec<(u32, u64)> = model.into_iter().collect();
        expected.sort_by_key(|&(k, v)| (v, k));
        let popped = drain(&mut heap);
        let popped_values: Vec<u64> = popped.iter().map(|(_, v)| *v).collect();
        let expected_values: Vec<u64> = expected.iter().map(|(_, v)| *v).collect();
        assert_eq!(popped_values, expected_values);
        assert_eq!(popped.len(), expected.len());
    }
}
