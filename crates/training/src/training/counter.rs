//! Pre-token counting for BPE training.
//!
//! Training never looks at the corpus again after segmentation: every
//! distinct pre-token is kept once, as raw bytes, together with the number of
//! times it occurred. Counters built from independent corpus shards can be
//! summed, which is how parallel segmentation is put back together.

use ahash::AHashMap;
use bpekit_core::{Pair, Result, Splitter};
use rayon::prelude::*;

/// Counter for pre-token frequencies.
#[derive(Debug, Clone, Default)]
pub struct PreTokenCounter {
    /// Pre-token bytes -> occurrence count
    counts: AHashMap<Vec<u8>, u64>,
}

impl PreTokenCounter {
    /// Create a new, empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Segment `text` and count its pre-tokens.
    ///
    /// Whitespace-only pre-tokens are dropped.
    pub fn add_text(&mut self, text: &str, splitter: &Splitter) -> Result<()> {
        for piece in splitter.pieces(text) {
            let piece = piece?;
            if piece.trim().is_empty() {
                continue;
            }
            self.add_pretoken(piece.as_bytes(), 1);
        }
        Ok(())
    }

    /// Add `count` occurrences of a single pre-token.
    pub fn add_pretoken(&mut self, bytes: &[u8], count: u64) {
        if let Some(existing) = self.counts.get_mut(bytes) {
            *existing += count;
        } else {
            self.counts.insert(bytes.to_vec(), count);
        }
    }

    /// Fold another counter into this one by summing counts.
    pub fn merge(&mut self, other: PreTokenCounter) {
        if self.counts.is_empty() {
            self.counts = other.counts;
            return;
        }
        for (bytes, count) in other.counts {
            *self.counts.entry(bytes).or_insert(0) += count;
        }
    }

    /// Count the pre-tokens of several shards in parallel.
    pub fn from_shards_parallel<S>(shards: &[S], splitter: &Splitter) -> Result<Self>
    where
        S: AsRef<str> + Sync,
    {
        shards
            .par_iter()
            .map(|shard| {
                let mut counter = PreTokenCounter::new();
                counter.add_text(shard.as_ref(), splitter)?;
                Ok(counter)
            })
            .try_reduce(PreTokenCounter::new, |mut acc, counter| {
                acc.merge(counter);
                Ok(acc)
            })
    }

    /// Count the pre-tokens of several shards one after another.
    pub fn from_shards_sequential<S: AsRef<str>>(shards: &[S], splitter: &Splitter) -> Result<Self> {
        let mut counter = PreTokenCounter::new();
        for shard in shards {
            counter.add_text(shard.as_ref(), splitter)?;
        }
        Ok(counter)
    }

    /// Get the number of distinct pre-tokens.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Get the total count of all pre-token occurrences.
    pub fn total_occurrences(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Count of a single pre-token.
    pub fn get(&self, bytes: &[u8]) -> u64 {
        self.counts.get(bytes).copied().unwrap_or(0)
    }

    /// Turn the counts into symbol sequences.
    ///
    /// Byte `b` becomes symbol `byte_offset + b`. Slots are assigned in
    /// byte-wise order of the pre-tokens so the layout does not depend on
    /// hashing or on how shards were combined.
    pub fn into_table(self, byte_offset: u32) -> PreTokenTable {
        let mut entries: Vec<(Vec<u8>, u64)> = self.counts.into_iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut sequences = Vec::with_capacity(entries.len());
        let mut counts = Vec::with_capacity(entries.len());
        for (bytes, count) in entries {
            sequences.push(bytes.iter().map(|&b| byte_offset + b as u32).collect());
            counts.push(count);
        }

        PreTokenTable { sequences, counts }
    }
}

/// Distinct pre-tokens as symbol sequences, addressed by slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreTokenTable {
    /// Slot -> current symbols
    pub sequences: Vec<Vec<u32>>,
    /// Slot -> occurrence count
    pub counts: Vec<u64>,
}

impl PreTokenTable {
    /// Number of slots.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Check if the table has no slots.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Recount all adjacent pairs from scratch.
    pub fn count_pairs(&self) -> AHashMap<Pair, u64> {
        let mut pair_counts: AHashMap<Pair, u64> = AHashMap::new();

        for (sequence, &count) in self.sequences.iter().zip(self.counts.iter()) {
            for window in sequence.windows(2) {
                *pair_counts.entry((window[0], window[1])).or_insert(0) += count;
            }
        }

        pair_counts
    }
}
