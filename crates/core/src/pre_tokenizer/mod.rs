//! Pre-tokenization.
//!
//! Splits raw text into pre-tokens before byte-level merging.

pub mod split;

pub use split::{SplitPattern, Splitter, GPT2_PATTERN};
