//! Priority queue for BPE merge candidates.
//!
//! Candidates are ordered by count first and then by the pair's byte strings,
//! so the queue's maximum is "most frequent pair, ties broken towards the
//! lexicographically greatest `(left, right)`". Counts change while training,
//! so entries are invalidated lazily: the queue remembers the latest count per
//! pair and skips popped entries that disagree with it.

use crate::core::merges::Pair;
use ahash::AHashMap;
use dary_heap::OctonaryHeap;
use std::cmp::Ordering;
use std::sync::Arc;

/// A merge candidate during BPE training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCandidate {
    /// The pair of symbol IDs to merge
    pub pair: Pair,
    /// The frequency/count of this pair
    pub count: u64,
    /// Bytes of the left symbol
    pub left: Arc<[u8]>,
    /// Bytes of the right symbol
    pub right: Arc<[u8]>,
}

impl MergeCandidate {
    /// Create a new merge candidate.
    pub fn new(pair: Pair, count: u64, left: Arc<[u8]>, right: Arc<[u8]>) -> Self {
        Self {
            pair,
            count,
            left,
            right,
        }
    }
}

// Higher count wins; equal counts fall back to byte-wise comparison of the
// pair so the ordering is total and independent of symbol IDs.
impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| self.left.cmp(&other.left))
            .then_with(|| self.right.cmp(&other.right))
            .then_with(|| self.pair.cmp(&other.pair))
    }
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue for BPE merge operations.
///
/// Uses an 8-ary heap for better cache locality than a binary heap.
pub struct PairPriorityQueue {
    /// The heap storing merge candidates
    heap: OctonaryHeap<MergeCandidate>,
    /// Track current counts to detect stale entries
    current_counts: AHashMap<Pair, u64>,
}

impl PairPriorityQueue {
    /// Create a new priority queue with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: OctonaryHeap::with_capacity(capacity),
            current_counts: AHashMap::with_capacity(capacity),
        }
    }

    /// Create a new empty priority queue.
    pub fn new() -> Self {
        Self {
            heap: OctonaryHeap::new(),
            current_counts: AHashMap::new(),
        }
    }

    /// Push a merge candidate, superseding any earlier entry for its pair.
    pub fn push(&mut self, candidate: MergeCandidate) {
        self.current_counts.insert(candidate.pair, candidate.count);
        self.heap.push(candidate);
    }

    /// Forget a pair entirely; its queued entries become stale.
    pub fn remove(&mut self, pair: Pair) {
        self.current_counts.remove(&pair);
    }

    /// Pop the highest priority merge candidate.
    ///
    /// Returns None if the queue is empty or only contains stale entries.
    pub fn pop(&mut self) -> Option<MergeCandidate> {
        while let Some(candidate) = self.heap.pop() {
            if self.current_counts.get(&candidate.pair) == Some(&candidate.count) {
                self.current_counts.remove(&candidate.pair);
                return Some(candidate);
            }
        }
        None
    }

    /// Get the number of (potentially stale) entries in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Get the current count for a pair.
    pub fn get_count(&self, pair: Pair) -> Option<u64> {
        self.current_counts.get(&pair).copied()
    }
}

impl Default for PairPriorityQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(pair: Pair, count: u64, left: &[u8], right: &[u8]) -> MergeCandidate {
        MergeCandidate::new(pair, count, Arc::from(left), Arc::from(right))
    }

    #[test]
    fn test_push_pop() {
        let mut queue = PairPriorityQueue::new();

        queue.push(candidate((0, 1), 10, b"a", b"b"));
        queue.push(candidate((1, 2), 20, b"b", b"c"));
        queue.push(candidate((2, 3), 15, b"c", b"d"));

        let first = queue.pop().unwrap();
        assert_eq!(first.pair, (1, 2));
        assert_eq!(first.count, 20);

        let second = queue.pop().unwrap();
        assert_eq!(second.pair, (2, 3));

        let third = queue.pop().unwrap();
        assert_eq!(third.pair, (0, 1));

        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_tie_prefers_greatest_bytes() {
        let mut queue = PairPriorityQueue::new();

        queue.push(candidate((0, 1), 2, b"a", b"b"));
        queue.push(candidate((2, 3), 2, b"c", b"d"));
        queue.push(candidate((2, 0), 2, b"c", b"a"));

        assert_eq!(queue.pop().unwrap().pair, (2, 3));
        assert_eq!(queue.pop().unwrap().pair, (2, 0));
        assert_eq!(queue.pop().unwrap().pair, (0, 1));
    }

    #[test]
    fn test_tie_compares_bytes_not_ids() {
        let mut queue = PairPriorityQueue::new();

        // Higher IDs but smaller bytes must lose the tie.
        queue.push(candidate((900, 901), 5, b"a", b"a"));
        queue.push(candidate((1, 2), 5, b"z", b"a"));

        assert_eq!(queue.pop().unwrap().pair, (1, 2));
    }

    #[test]
    fn test_stale_entry_detection() {
        let mut queue = PairPriorityQueue::new();

        queue.push(candidate((0, 1), 10, b"a", b"b"));
        queue.push(candidate((1, 2), 20, b"b", b"c"));

        // Lowering (1, 2) makes its first entry stale
        queue.push(candidate((1, 2), 5, b"b", b"c"));

        let first = queue.pop().unwrap();
        assert_eq!(first.pair, (0, 1));

        let second = queue.pop().unwrap();
        assert_eq!(second.pair, (1, 2));
        assert_eq!(second.count, 5);

        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_remove() {
        let mut queue = PairPriorityQueue::new();

        queue.push(candidate((0, 1), 10, b"a", b"b"));
        assert_eq!(queue.get_count((0, 1)), Some(10));

        queue.remove((0, 1));
        assert_eq!(queue.get_count((0, 1)), None);
        assert!(!queue.is_empty());
        assert!(queue.pop().is_none());
    }
}
