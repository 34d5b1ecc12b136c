//! Incremental pair frequency index.
//!
//! For every adjacent symbol pair the index keeps the frequency-weighted
//! count across all sequences and the set of `(slot, position)` places where
//! it occurs. A merge only touches the sequences listed under the merged
//! pair: each is removed from the index, rewritten and added back.
//!
//! Pairs whose count changed are remembered as dirty until the trainer
//! collects them with [`PairIndex::take_dirty`] to refresh its queue.

use super::counter::PreTokenTable;
use ahash::{AHashMap, AHashSet};
use bpekit_core::Pair;

/// A place where a pair starts: `(slot, position)`.
pub type Occurrence = (usize, usize);

/// Pair counts plus occurrence sets, kept consistent with a [`PreTokenTable`].
#[derive(Debug, Default)]
pub struct PairIndex {
    counts: AHashMap<Pair, u64>,
    occurrences: AHashMap<Pair, AHashSet<Occurrence>>,
    dirty: AHashSet<Pair>,
}

impl PairIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every sequence of a table.
    pub fn build(table: &PreTokenTable) -> Self {
        let mut index = Self::new();
        for (slot, (sequence, &count)) in table.sequences.iter().zip(&table.counts).enumerate() {
            index.add_sequence(slot, sequence, count);
        }
        index
    }

    /// Add the pairs of one sequence.
    pub fn add_sequence(&mut self, slot: usize, symbols: &[u32], count: u64) {
        for (pos, window) in symbols.windows(2).enumerate() {
            let pair = (window[0], window[1]);
            *self.counts.entry(pair).or_insert(0) += count;
            self.occurrences.entry(pair).or_default().insert((slot, pos));
            self.dirty.insert(pair);
        }
    }

    /// Remove the pairs of one sequence, as previously added.
    pub fn remove_sequence(&mut self, slot: usize, symbols: &[u32], count: u64) {
        for (pos, window) in symbols.windows(2).enumerate() {
            let pair = (window[0], window[1]);
            self.dirty.insert(pair);

            let Some(current) = self.counts.get_mut(&pair) else {
                continue;
            };
            debug_assert!(*current >= count);
            *current = current.saturating_sub(count);

            if *current == 0 {
                self.counts.remove(&pair);
                self.occurrences.remove(&pair);
            } else if let Some(places) = self.occurrences.get_mut(&pair) {
                places.remove(&(slot, pos));
            }
        }
    }

    /// Current count of a pair, 0 if absent.
    #[inline]
    pub fn count(&self, pair: Pair) -> u64 {
        self.counts.get(&pair).copied().unwrap_or(0)
    }

    /// All current counts.
    pub fn counts(&self) -> &AHashMap<Pair, u64> {
        &self.counts
    }

    /// Where a pair occurs.
    pub fn occurrences(&self, pair: Pair) -> Option<&AHashSet<Occurrence>> {
        self.occurrences.get(&pair)
    }

    /// Distinct slots containing a pair, in ascending order.
    pub fn slots_containing(&self, pair: Pair) -> Vec<usize> {
        let mut slots: Vec<usize> = self
            .occurrences
            .get(&pair)
            .map(|places| places.iter().map(|&(slot, _)| slot).collect())
            .unwrap_or_default();
        slots.sort_unstable();
        slots.dedup();
        slots
    }

    /// Drain the pairs whose count changed since the last call.
    pub fn take_dirty(&mut self) -> Vec<Pair> {
        let mut pairs: Vec<Pair> = self.dirty.drain().collect();
        pairs.sort_unstable();
        pairs
    }

    /// Number of distinct pairs.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if no pairs remain.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Check that counts and occurrences agree with the table.
    ///
    /// Used by tests after every merge.
    pub fn matches(&self, table: &PreTokenTable) -> bool {
        if self.counts != table.count_pairs() {
            return false;
        }

        let mut expected: AHashMap<Pair, AHashSet<Occurrence>> = AHashMap::new();
        for (slot, sequence) in table.sequences.iter().enumerate() {
            for (pos, window) in sequence.windows(2).enumerate() {
                expected
                    .entry((window[0], window[1]))
                    .or_default()
                    .insert((slot, pos));
            }
        }

        expected == self.occurrences
    }
}
