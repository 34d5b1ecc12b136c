//! bpekit-training - Byte-level BPE training
//!
//! This crate learns a vocabulary and an ordered merge table from raw text.
//!
//! # Features
//!
//! - GPT-2 style or whitespace pre-tokenization
//! - Incremental pair counting: each merge only revisits the pre-tokens that
//!   contain the merged pair
//! - Deterministic tie-breaking on the pair's bytes
//! - Parallel segmentation of corpus shards with rayon
//!
//! # Example
//!
//! ```rust
//! use bpekit_training::{BpeTrainer, TrainingConfig};
//! use bpekit_core::SplitPattern;
//!
//! let config = TrainingConfig::default()
//!     .with_vocab_size(257)
//!     .with_split_pattern(SplitPattern::Whitespace);
//!
//! let model = BpeTrainer::new(config).train("ab ab ab")?;
//! assert_eq!(model.merges.get(0), Some((&b"a"[..], &b"b"[..])));
//! assert_eq!(model.vocab.get_id(b"ab"), Some(256));
//! # Ok::<(), bpekit_training::TokenizerError>(())
//! ```

pub use bpekit_core::{Result, TokenizerError};

pub mod training;
pub use training::{
    merge_sequence, BpeTrainer, PairIndex, PreTokenCounter, PreTokenTable, TrainedModel,
    TrainingConfig,
};
