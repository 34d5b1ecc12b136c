//! Special-token segmentation.
//!
//! Text is cut into spans that are either an exact special token or a run
//! of ordinary text. At every position the longest special token wins.

use aho_corasick::{AhoCorasick, FindIter, MatchKind};
use bpekit_core::Result;

/// A piece of input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'t> {
    /// A configured special token
    Special(&'t str),
    /// Text between special tokens, never empty
    Plain(&'t str),
}

impl<'t> Span<'t> {
    /// The text covered by this span.
    pub fn as_str(&self) -> &'t str {
        match self {
            Span::Special(text) | Span::Plain(text) => text,
        }
    }
}

/// Splits text around special tokens.
#[derive(Debug, Clone)]
pub struct SpecialTokenSplitter {
    /// Deduplicated tokens, longest first
    tokens: Vec<String>,
    /// `None` when there are no special tokens
    matcher: Option<AhoCorasick>,
}

impl SpecialTokenSplitter {
    /// Build a splitter for the given tokens.
    ///
    /// Duplicates and empty strings are ignored.
    pub fn new<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let mut unique: Vec<String> = Vec::with_capacity(tokens.len());
        for token in tokens {
            let token = token.as_ref();
            if !token.is_empty() && !unique.iter().any(|t| t == token) {
                unique.push(token.to_string());
            }
        }
        // Stable, so equal lengths keep their configured order
        unique.sort_by(|a, b| b.len().cmp(&a.len()));

        let matcher = if unique.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .match_kind(MatchKind::LeftmostLongest)
                    .build(&unique)?,
            )
        };

        Ok(Self {
            tokens: unique,
            matcher,
        })
    }

    /// The tokens this splitter matches, longest first.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Lazily split `text` into spans.
    pub fn split<'s, 't>(&'s self, text: &'t str) -> Spans<'s, 't> {
        Spans {
            text,
            pos: 0,
            matches: self.matcher.as_ref().map(|m| m.find_iter(text)),
            pending: None,
        }
    }
}

/// Iterator over the spans of one text.
pub struct Spans<'s, 't> {
    text: &'t str,
    pos: usize,
    matches: Option<FindIter<'s, 't>>,
    /// A special token found after a plain run that was returned first
    pending: Option<(usize, usize)>,
}

impl<'s, 't> Spans<'s, 't> {
    fn special(&mut self, start: usize, end: usize) -> Span<'t> {
        self.pos = end;
        Span::Special(&self.text[start..end])
    }
}

impl<'s, 't> Iterator for Spans<'s, 't> {
    type Item = Span<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((start, end)) = self.pending.take() {
            return Some(self.special(start, end));
        }

        match self.matches.as_mut().and_then(Iterator::next) {
            Some(found) if found.start() > self.pos => {
                let plain = &self.text[self.pos..found.start()];
                self.pending = Some((found.start(), found.end()));
                Some(Span::Plain(plain))
            }
            Some(found) => Some(self.special(found.start(), found.end())),
            None if self.pos < self.text.len() => {
                let plain = &self.text[self.pos..];
                self.pos = self.text.len();
                Some(Span::Plain(plain))
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans<'t>(splitter: &SpecialTokenSplitter, text: &'t str) -> Vec<Span<'t>> {
        splitter.split(text).collect()
    }

    #[test]
    fn test_no_special_tokens() {
        let splitter = SpecialTokenSplitter::new::<&str>(&[]).unwrap();
        assert!(splitter.is_empty());
        assert_eq!(spans(&splitter, "hello"), vec![Span::Plain("hello")]);
        assert!(spans(&splitter, "").is_empty());
    }

    #[test]
    fn test_split_around_tokens() {
        let splitter = SpecialTokenSplitter::new(&["<|endoftext|>"]).unwrap();
        assert_eq!(
            spans(&splitter, "a<|endoftext|>b<|endoftext|><|endoftext|>"),
            vec![
                Span::Plain("a"),
                Span::Special("<|endoftext|>"),
                Span::Plain("b"),
                Span::Special("<|endoftext|>"),
                Span::Special("<|endoftext|>"),
            ]
        );
        assert_eq!(
            spans(&splitter, "<|endoftext|>"),
            vec![Span::Special("<|endoftext|>")]
        );
    }

    #[test]
    fn test_longest_token_wins() {
        let splitter = SpecialTokenSplitter::new(&["<|a|>", "<|a|><|b|>"]).unwrap();
        assert_eq!(splitter.tokens()[0], "<|a|><|b|>");
        assert_eq!(
            spans(&splitter, "x<|a|><|b|><|a|>"),
            vec![
                Span::Plain("x"),
                Span::Special("<|a|><|b|>"),
                Span::Special("<|a|>"),
            ]
        );
    }

    #[test]
    fn test_concatenation_reconstructs_input() {
        let splitter = SpecialTokenSplitter::new(&["<s>", "</s>", "<s>", ""]).unwrap();
        assert_eq!(splitter.tokens().len(), 2);

        let text = "<s>héllo</s> world <s";
        let joined: String = splitter.split(text).map(|span| span.as_str()).collect();
        assert_eq!(joined, text);
    }
}
