//! Core BPE data structures.
//!
//! Vocabulary, merge rules and the merge candidate queue are shared by the
//! trainer (which produces them) and the runtime (which consumes them).

pub mod merges;
pub mod priority;
pub mod vocab;

pub use merges::{MergeMap, MergeRules, MergeTable, Pair};
pub use priority::{MergeCandidate, PairPriorityQueue};
pub use vocab::{Vocab, VocabR, Vocabulary, BYTE_ALPHABET};
