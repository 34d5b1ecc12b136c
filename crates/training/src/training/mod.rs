//! Training infrastructure for BPE tokenizers.
//!
//! Pre-tokens are counted once ([`counter`]), indexed by adjacent pair
//! ([`index`]) and merged greedily by the [`trainer`].

pub mod counter;
pub mod index;
pub mod trainer;

pub use counter::{PreTokenCounter, PreTokenTable};
pub use index::{Occurrence, PairIndex};
pub use trainer::{merge_sequence, BpeTrainer, TrainedModel, TrainingConfig};
