//! Error types for the BPE tokenizer library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the tokenizer library.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// A vocabulary file line that is not `<id>\t<token>`
    #[error("Malformed vocab line {line}: {content:?} (expected <id>\\t<token>)")]
    MalformedVocabLine { line: usize, content: String },

    /// A merges file line that is not `<left> <right>`
    #[error("Malformed merge line {line}: {content:?} (expected two tokens)")]
    MalformedMergeLine { line: usize, content: String },

    /// A special token whose bytes are missing from the vocabulary
    #[error("Special token not found in vocab: {0:?}")]
    UnknownSpecialToken(String),

    /// A symbol left after merging that has no vocabulary ID
    #[error("Unknown byte symbol encountered: {}", render_bytes(.0))]
    UnknownByteSymbol(Vec<u8>),

    /// Unknown token ID
    #[error("Unknown token ID: {0}")]
    UnknownTokenId(u32),

    /// I/O error with file context
    #[error("I/O error for {path}: {err}")]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Pre-tokenization pattern failed to compile
    #[error("Invalid pre-tokenization pattern: {0}")]
    InvalidPattern(#[from] fancy_regex::Error),

    /// Pattern engine gave up while scanning text (e.g. backtrack limit)
    #[error("Pattern match failed: {0}")]
    PatternMatch(String),

    /// Special-token matcher could not be built
    #[error("Special token matcher build error: {0}")]
    SpecialMatcher(#[from] aho_corasick::BuildError),
}

impl TokenizerError {
    /// Wrap an I/O error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            err,
        }
    }
}

fn render_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => format!("{s:?}"),
        Err(_) => format!("{bytes:02x?}"),
    }
}

/// Result type alias for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizerError>;
