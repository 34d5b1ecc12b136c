//! Merge rule management for BPE.
//!
//! Two views of the same data live here:
//!
//! - [`MergeTable`]: the ordered list of `(left, right)` byte-string pairs a
//!   trainer produces and the merges file persists. Position is priority.
//! - [`MergeRules`]: the runtime lookup over interned symbol IDs,
//!   `pair -> (rank, merged_symbol)`, used for O(1) priority comparison.

use ahash::AHashMap;

/// A pair of symbol IDs that can be merged.
pub type Pair = (u32, u32);

/// Merge rule mapping: pair -> (rank, new_symbol_id).
///
/// The rank indicates the priority of this merge rule (lower rank = higher priority).
/// The new_symbol_id is the ID of the symbol created by merging this pair.
pub type MergeMap = AHashMap<Pair, (u32, u32)>;

/// Ordered merge rules as byte strings. Index 0 has the highest priority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeTable {
    merges: Vec<(Vec<u8>, Vec<u8>)>,
}

impl MergeTable {
    /// Create an empty merge table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty merge table with room for `capacity` rules.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            merges: Vec::with_capacity(capacity),
        }
    }

    /// Append a rule at the lowest priority. Returns its rank.
    pub fn push(&mut self, left: Vec<u8>, right: Vec<u8>) -> u32 {
        self.merges.push((left, right));
        (self.merges.len() - 1) as u32
    }

    /// Get the rule at `rank`.
    #[inline]
    pub fn get(&self, rank: usize) -> Option<(&[u8], &[u8])> {
        self.merges
            .get(rank)
            .map(|(left, right)| (left.as_slice(), right.as_slice()))
    }

    /// Iterate rules in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        self.merges
            .iter()
            .map(|(left, right)| (left.as_slice(), right.as_slice()))
    }

    /// Get the number of merge rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.merges.len()
    }

    /// Check if there are no merge rules.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }

    /// Consume the table, returning the rules in priority order.
    pub fn into_inner(self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.merges
    }
}

impl From<Vec<(Vec<u8>, Vec<u8>)>> for MergeTable {
    fn from(merges: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        Self { merges }
    }
}

impl FromIterator<(Vec<u8>, Vec<u8>)> for MergeTable {
    fn from_iter<I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>>(iter: I) -> Self {
        Self {
            merges: iter.into_iter().collect(),
        }
    }
}

/// Collection of BPE merge rules with efficient lookup.
#[derive(Debug, Clone)]
pub struct MergeRules {
    /// Merge rules: pair -> (rank, new_symbol_id)
    pub merges: MergeMap,
    /// Maximum rank (for validation and ordering)
    pub max_rank: u32,
}

impl MergeRules {
    /// Create a new empty collection of merge rules.
    pub fn new() -> Self {
        Self {
            merges: MergeMap::new(),
            max_rank: 0,
        }
    }

    /// Create a new collection with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            merges: MergeMap::with_capacity(capacity),
            max_rank: 0,
        }
    }

    /// Add a merge rule.
    ///
    /// If the pair is already known, the existing (higher priority) rule is kept.
    ///
    /// # Arguments
    /// * `pair` - The pair of symbol IDs to merge
    /// * `rank` - The priority rank (lower = higher priority)
    /// * `new_symbol_id` - The ID of the symbol created by this merge
    pub fn add_merge(&mut self, pair: Pair, rank: u32, new_symbol_id: u32) {
        let entry = self.merges.entry(pair).or_insert((rank, new_symbol_id));
        if rank < entry.0 {
            *entry = (rank, new_symbol_id);
        }
        self.max_rank = self.max_rank.max(rank);
    }

    /// Get the merge rule for a pair.
    ///
    /// Returns Some((rank, new_symbol_id)) if this pair should be merged,
    /// None otherwise.
    #[inline]
    pub fn get(&self, pair: Pair) -> Option<(u32, u32)> {
        self.merges.get(&pair).copied()
    }

    /// Get the number of merge rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.merges.len()
    }

    /// Check if there are no merge rules.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }
}

impl Default for MergeRules {
    fn default() -> Self {
        Self::new()
    }
}
