//! bpekit-tokenizer - Byte-level BPE tokenizer runtime
//!
//! This crate turns a trained vocabulary and merge table into a tokenizer
//! that encodes text to token IDs and decodes them back.
//!
//! # Features
//!
//! - Special tokens are always encoded as their reserved ID, longest match first
//! - Any UTF-8 text round-trips; decoding repairs invalid UTF-8 instead of failing
//! - Streaming encoding over chunks and parallel batch encoding
//! - Plain-text vocabulary and merges files
//!
//! # Example
//!
//! ```rust
//! use bpekit_tokenizer::Tokenizer;
//! use bpekit_training::{BpeTrainer, TrainingConfig};
//! use bpekit_core::SplitPattern;
//!
//! let config = TrainingConfig::default()
//!     .with_vocab_size(257)
//!     .with_split_pattern(SplitPattern::Whitespace);
//! let model = BpeTrainer::new(config).train("ab ab ab")?;
//!
//! let tokenizer = Tokenizer::from_trained(model)?;
//! let ids = tokenizer.encode("ab ab")?;
//! assert_eq!(ids, vec![256, 32, 256]);
//! assert_eq!(tokenizer.decode(&ids)?, "ab ab");
//! # Ok::<(), bpekit_tokenizer::TokenizerError>(())
//! ```

pub use bpekit_core::{MergeTable, Result, TokenizerError, Vocabulary};

pub mod tokenizer;
pub use tokenizer::{apply_one_best_merge, EncodeIter, Tokenizer, TokenizerBuilder};

pub mod special;
pub use special::{Span, SpecialTokenSplitter};

pub mod io;
pub use io::{TokenizerLoader, TokenizerSaver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
