//! Text splitting for pre-tokenization.
//!
//! Two strategies are supported: a GPT-2 style pattern that separates
//! contractions, letter runs, digit runs, punctuation runs and whitespace
//! runs, and plain whitespace splitting.

use crate::error::{Result, TokenizerError};
use fancy_regex::Regex;
use serde::{Deserialize, Serialize};

/// GPT-2 pre-tokenization pattern.
///
/// The `\s+(?!\S)` branch needs look-ahead, hence `fancy-regex`.
pub const GPT2_PATTERN: &str =
    r"'(?:[sdmt]|ll|ve|re)| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

/// Splitting patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitPattern {
    /// Contractions, letters, digits, punctuation and whitespace runs
    #[default]
    Gpt2,
    /// Split on whitespace
    Whitespace,
}

/// Text splitter for pre-tokenization.
#[derive(Debug, Clone)]
pub struct Splitter {
    /// Pattern to split on
    pattern: SplitPattern,
    /// Compiled pattern for `SplitPattern::Gpt2`
    regex: Option<Regex>,
}

impl Splitter {
    /// Create a new splitter, compiling its pattern if it needs one.
    pub fn new(pattern: SplitPattern) -> Result<Self> {
        let regex = match pattern {
            SplitPattern::Gpt2 => Some(Regex::new(GPT2_PATTERN)?),
            SplitPattern::Whitespace => None,
        };
        Ok(Self { pattern, regex })
    }

    /// Create a whitespace splitter.
    pub fn whitespace() -> Self {
        Self {
            pattern: SplitPattern::Whitespace,
            regex: None,
        }
    }

    /// Create a GPT-2 pattern splitter.
    pub fn gpt2() -> Result<Self> {
        Self::new(SplitPattern::Gpt2)
    }

    /// The pattern this splitter applies.
    pub fn pattern(&self) -> SplitPattern {
        self.pattern
    }

    /// Lazily split text into pre-tokens.
    pub fn pieces<'s, 't>(&'s self, text: &'t str) -> Pieces<'s, 't> {
        match &self.regex {
            Some(regex) => Pieces::Pattern(regex.find_iter(text)),
            None => Pieces::Whitespace(text.split_whitespace()),
        }
    }

    /// Split text into chunks.
    pub fn split<'t>(&self, text: &'t str) -> Result<Vec<&'t str>> {
        self.pieces(text).collect()
    }
}

/// Iterator over the pre-tokens of one text.
pub enum Pieces<'s, 't> {
    Whitespace(std::str::SplitWhitespace<'t>),
    Pattern(fancy_regex::Matches<'s, 't>),
}

impl<'s, 't> Iterator for Pieces<'s, 't> {
    type Item = Result<&'t str>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Pieces::Whitespace(words) => words.next().map(Ok),
            Pieces::Pattern(matches) => matches.next().map(|found| {
                found
                    .map(|m| m.as_str())
                    .map_err(|e| TokenizerError::PatternMatch(e.to_string()))
            }),
        }
    }
}
