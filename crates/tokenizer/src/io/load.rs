//! Load functionality for trained tokenizers.

use super::escape::unescape_token;
use bpekit_core::{MergeTable, Result, TokenizerError, Vocabulary};
use std::path::Path;

/// Tokenizer loader - reads vocabulary and merges files.
pub struct TokenizerLoader;

impl TokenizerLoader {
    /// Load both files.
    pub fn load(
        vocab_path: impl AsRef<Path>,
        merges_path: impl AsRef<Path>,
    ) -> Result<(Vocabulary, MergeTable)> {
        let vocab = Self::load_vocab(vocab_path)?;
        let merges = Self::load_merges(merges_path)?;
        Ok((vocab, merges))
    }

    /// Load a vocabulary file.
    pub fn load_vocab(path: impl AsRef<Path>) -> Result<Vocabulary> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TokenizerError::io(path, e))?;
        let vocab = Self::parse_vocab(&content)?;
        log::debug!("Loaded {} vocabulary entries from {}", vocab.len(), path.display());
        Ok(vocab)
    }

    /// Load a merges file.
    pub fn load_merges(path: impl AsRef<Path>) -> Result<MergeTable> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TokenizerError::io(path, e))?;
        let merges = Self::parse_merges(&content)?;
        log::debug!("Loaded {} merges from {}", merges.len(), path.display());
        Ok(merges)
    }

    /// Parse vocabulary file contents.
    pub fn parse_vocab(content: &str) -> Result<Vocabulary> {
        let mut vocab = Vocabulary::new();

        for (line_num, line) in lines(content) {
            let malformed = || TokenizerError::MalformedVocabLine {
                line: line_num,
                content: line.to_string(),
            };

            let mut fields = line.split('\t');
            let (Some(id), Some(token), None) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(malformed());
            };

            let id: u32 = id.parse().map_err(|_| malformed())?;
            if vocab.get_token(id).is_some() {
                return Err(malformed());
            }

            vocab.add_token_with_id(&unescape_token(token), id)?;
        }

        Ok(vocab)
    }

    /// Parse merges file contents. Line order is rank order.
    pub fn parse_merges(content: &str) -> Result<MergeTable> {
        let mut merges = MergeTable::new();

        for (line_num, line) in lines(content) {
            let mut fields = line.split_whitespace();
            let (Some(left), Some(right), None) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(TokenizerError::MalformedMergeLine {
                    line: line_num,
                    content: line.to_string(),
                });
            };

            merges.push(unescape_token(left), unescape_token(right));
        }

        Ok(merges)
    }
}

/// Non-empty lines with their 1-based line numbers, trailing `\r` removed.
fn lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .split('\n')
        .enumerate()
        .map(|(i, line)| (i + 1, line.strip_suffix('\r').unwrap_or(line)))
        .filter(|(_, line)| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vocab() {
        let vocab = TokenizerLoader::parse_vocab("0\t<|endoftext|>\n1\ta\r\n\n7\t\\sx\\t\n").unwrap();

        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.get_id(b"<|endoftext|>"), Some(0));
        assert_eq!(vocab.get_id(b"a"), Some(1));
        assert_eq!(vocab.get_token(7), Some(&b" x\t"[..]));
    }

    #[test]
    fn test_vocab_keeps_leading_space() {
        let vocab = TokenizerLoader::parse_vocab("3\t the").unwrap();
        assert_eq!(vocab.get_token(3), Some(&b" the"[..]));
    }

    #[test]
    fn test_malformed_vocab_lines() {
        for (content, line) in [
            ("0\ta\nno-tab-here\n", 2),
            ("0\ta\tb", 1),
            ("x\ta", 1),
            ("-1\ta", 1),
            ("0\ta\n\n0\tb", 3),
        ] {
            match TokenizerLoader::parse_vocab(content) {
                Err(TokenizerError::MalformedVocabLine { line: got, .. }) => {
                    assert_eq!(got, line, "{:?}", content)
                }
                other => panic!("expected malformed line for {:?}, got {:?}", content, other),
            }
        }
    }

    #[test]
    fn test_parse_merges() {
        let merges = TokenizerLoader::parse_merges("a b\r\n\\sthe r\n\nab c").unwrap();

        assert_eq!(merges.len(), 3);
        assert_eq!(merges.get(0), Some((&b"a"[..], &b"b"[..])));
        assert_eq!(merges.get(1), Some((&b" the"[..], &b"r"[..])));
        assert_eq!(merges.get(2), Some((&b"ab"[..], &b"c"[..])));
    }

    #[test]
    fn test_malformed_merge_lines() {
        for (content, line) in [("a b\nabc\n", 2), ("a b c", 1), ("   ", 1)] {
            match TokenizerLoader::parse_merges(content) {
                Err(TokenizerError::MalformedMergeLine { line: got, content: text }) => {
                    assert_eq!(got, line);
                    assert!(content.contains(&text));
                }
                other => panic!("expected malformed line for {:?}, got {:?}", content, other),
            }
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = TokenizerLoader::load_vocab(dir.path().join("missing.txt"));
        assert!(matches!(result, Err(TokenizerError::Io { .. })));
    }
}
