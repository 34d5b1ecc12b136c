//! Vocabulary storage and lookup.
//!
//! A vocabulary maps token IDs to opaque byte strings and back.
//! Both directions are kept in `AHashMap`s so encoding (bytes -> ID) and
//! decoding (ID -> bytes) are single lookups.

use crate::error::{Result, TokenizerError};
use ahash::AHashMap;

/// Forward mapping: token bytes -> ID
pub type Vocab = AHashMap<Vec<u8>, u32>;

/// Reverse mapping: ID -> token bytes
pub type VocabR = AHashMap<u32, Vec<u8>>;

/// Number of single-byte tokens in a byte-level vocabulary.
pub const BYTE_ALPHABET: usize = 256;

/// Vocabulary with forward and reverse mappings.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    /// Forward mapping: token bytes -> ID
    vocab: Vocab,
    /// Reverse mapping: ID -> token bytes
    vocab_r: VocabR,
    /// One past the highest assigned ID
    next_id: u32,
}

impl Vocabulary {
    /// Create a new empty vocabulary.
    pub fn new() -> Self {
        Self {
            vocab: Vocab::new(),
            vocab_r: VocabR::new(),
            next_id: 0,
        }
    }

    /// Create a new vocabulary with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vocab: Vocab::with_capacity(capacity),
            vocab_r: VocabR::with_capacity(capacity),
            next_id: 0,
        }
    }

    /// Create the starting vocabulary for byte-level training.
    ///
    /// Special tokens take IDs `0..k` in the given order, followed by the 256
    /// single bytes at `k..k + 256` in byte-value order. Callers are expected
    /// to have removed duplicate special tokens.
    pub fn byte_level<S: AsRef<str>>(special_tokens: &[S]) -> Result<Self> {
        let mut vocab = Self::with_capacity(special_tokens.len() + BYTE_ALPHABET);

        for token in special_tokens {
            let id = vocab.next_id();
            vocab.add_token_with_id(token.as_ref().as_bytes(), id)?;
        }

        for byte in 0..=u8::MAX {
            let id = vocab.next_id();
            vocab.add_token_with_id(&[byte], id)?;
        }

        Ok(vocab)
    }

    /// Add a token to the vocabulary.
    ///
    /// Returns the ID assigned to the token. Adding a byte string that is
    /// already present returns its existing ID.
    pub fn add_token(&mut self, token: &[u8]) -> u32 {
        if let Some(&id) = self.vocab.get(token) {
            return id;
        }

        let id = self.next_id;
        self.insert(token, id);

        id
    }

    /// Add a token with a specific ID.
    ///
    /// Returns an error if the ID is already taken. If the byte string is
    /// already present under another ID, the new ID still decodes to it but
    /// byte lookups keep resolving to the earlier ID.
    pub fn add_token_with_id(&mut self, token: &[u8], id: u32) -> Result<()> {
        if self.vocab_r.contains_key(&id) {
            return Err(TokenizerError::InvalidConfig(format!(
                "Token ID {} already exists",
                id
            )));
        }

        self.insert(token, id);

        Ok(())
    }

    fn insert(&mut self, token: &[u8], id: u32) {
        self.vocab_r.insert(id, token.to_vec());
        self.vocab.entry(token.to_vec()).or_insert(id);
        self.next_id = self.next_id.max(id.saturating_add(1));
    }

    /// Get the ID for a byte string.
    #[inline]
    pub fn get_id(&self, token: &[u8]) -> Option<u32> {
        self.vocab.get(token).copied()
    }

    /// Get the byte string for an ID.
    #[inline]
    pub fn get_token(&self, id: u32) -> Option<&[u8]> {
        self.vocab_r.get(&id).map(Vec::as_slice)
    }

    /// The ID that the next appended token would receive (one past the maximum ID).
    #[inline]
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Get the size of the vocabulary.
    #[inline]
    pub fn len(&self) -> usize {
        self.vocab_r.len()
    }

    /// Check if the vocabulary is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vocab_r.is_empty()
    }

    /// All `(id, bytes)` entries in ascending ID order.
    pub fn entries(&self) -> Vec<(u32, &[u8])> {
        let mut entries: Vec<(u32, &[u8])> = self
            .vocab_r
            .iter()
            .map(|(&id, token)| (id, token.as_slice()))
            .collect();
        entries.sort_unstable_by_key(|&(id, _)| id);
        entries
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_token() {
        let mut vocab = Vocabulary::new();
        let id1 = vocab.add_token(b"hello");
        let id2 = vocab.add_token(b"world");

        assert_eq!(id1, 0);
        assert_eq!(id2, 1);
        assert_eq!(vocab.get_id(b"hello"), Some(0));
        assert_eq!(vocab.get_id(b"world"), Some(1));
        assert_eq!(vocab.get_token(0), Some(&b"hello"[..]));
        assert_eq!(vocab.get_token(1), Some(&b"world"[..]));
    }

    #[test]
    fn test_add_duplicate_token() {
        let mut vocab = Vocabulary::new();
        let id1 = vocab.add_token(b"hello");
        let id2 = vocab.add_token(b"hello");

        assert_eq!(id1, id2);
        assert_eq!(vocab.len(), 1);
    }

    #[test]
    fn test_add_token_with_id() {
        let mut vocab = Vocabulary::new();
        vocab.add_token_with_id(b"hello", 5).unwrap();
        vocab.add_token_with_id(b"world", 10).unwrap();

        assert_eq!(vocab.get_id(b"hello"), Some(5));
        assert_eq!(vocab.get_token(10), Some(&b"world"[..]));
        assert_eq!(vocab.next_id(), 11);

        assert!(vocab.add_token_with_id(b"again", 5).is_err());

        // Same bytes under a second ID: decodes, but lookups keep the first ID
        vocab.add_token_with_id(b"hello", 11).unwrap();
        assert_eq!(vocab.get_token(11), Some(&b"hello"[..]));
        assert_eq!(vocab.get_id(b"hello"), Some(5));
        assert_eq!(vocab.len(), 3);
    }

    #[test]
    fn test_byte_level_layout() {
        let vocab = Vocabulary::byte_level(&["<|endoftext|>", "<pad>"]).unwrap();

        assert_eq!(vocab.len(), 2 + BYTE_ALPHABET);
        assert_eq!(vocab.get_id(b"<|endoftext|>"), Some(0));
        assert_eq!(vocab.get_id(b"<pad>"), Some(1));
        for byte in 0..=u8::MAX {
            assert_eq!(vocab.get_id(&[byte]), Some(2 + byte as u32));
        }
    }

    #[test]
    fn test_entries_sorted() {
        let mut vocab = Vocabulary::new();
        vocab.add_token_with_id(b"c", 2).unwrap();
        vocab.add_token_with_id(b"a", 0).unwrap();
        vocab.add_token_with_id(b"b", 1).unwrap();

        let ids: Vec<u32> = vocab.entries().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
