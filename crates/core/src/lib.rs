//! bpekit-core - Core byte-level BPE data structures
//!
//! This crate provides the data shared by the trainer and the tokenizer
//! runtime: the ID <-> byte-string vocabulary, the ranked merge table, the
//! merge candidate queue, pre-tokenization and the error type.
//!
//! # Example
//!
//! ```rust
//! use bpekit_core::Vocabulary;
//!
//! let vocab = Vocabulary::byte_level(&["<|endoftext|>"])?;
//! assert_eq!(vocab.get_id(b"<|endoftext|>"), Some(0));
//! assert_eq!(vocab.get_id(b"a"), Some(1 + b'a' as u32));
//! # Ok::<(), bpekit_core::TokenizerError>(())
//! ```

pub mod error;
pub use error::{Result, TokenizerError};

pub mod core;
pub use core::{
    MergeCandidate, MergeMap, MergeRules, MergeTable, Pair, PairPriorityQueue, Vocab, VocabR,
    Vocabulary, BYTE_ALPHABET,
};

pub mod pre_tokenizer;
pub use pre_tokenizer::{SplitPattern, Splitter, GPT2_PATTERN};
