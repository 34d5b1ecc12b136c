//! Main tokenizer implementation.
//!
//! A [`Tokenizer`] is built from a vocabulary, an ordered merge table and a
//! list of special tokens. Encoding cuts the text around special tokens,
//! then turns every other run into bytes and merges them by rank. Decoding
//! concatenates token bytes and repairs invalid UTF-8.

use crate::io::{TokenizerLoader, TokenizerSaver};
use crate::special::{Span, SpecialTokenSplitter};
use ahash::AHashMap;
use bpekit_core::{MergeRules, MergeTable, Result, TokenizerError, Vocabulary};
use bpekit_training::TrainedModel;
use rayon::prelude::*;
use std::path::Path;

/// Merge the best adjacent pair of `symbols` in place.
///
/// The best pair is the one with the lowest rank; if it occurs more than
/// once, its leftmost occurrence is merged. Returns `false` when no
/// adjacent pair has a rule, leaving `symbols` untouched.
pub fn apply_one_best_merge(symbols: &mut Vec<u32>, rules: &MergeRules) -> bool {
    let mut best: Option<(u32, usize, u32)> = None;

    for (pos, window) in symbols.windows(2).enumerate() {
        if let Some((rank, merged)) = rules.get((window[0], window[1])) {
            if best.map_or(true, |(best_rank, _, _)| rank < best_rank) {
                best = Some((rank, pos, merged));
            }
        }
    }

    match best {
        Some((_, pos, merged)) => {
            symbols[pos] = merged;
            symbols.remove(pos + 1);
            true
        }
        None => false,
    }
}

/// Builder for creating a tokenizer.
#[derive(Debug, Clone, Default)]
pub struct TokenizerBuilder {
    vocab: Vocabulary,
    merges: MergeTable,
    special_tokens: Vec<String>,
}

impl TokenizerBuilder {
    /// Create a new tokenizer builder with an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vocab(mut self, vocab: Vocabulary) -> Self {
        self.vocab = vocab;
        self
    }

    pub fn merges(mut self, merges: MergeTable) -> Self {
        self.merges = merges;
        self
    }

    /// Add one special token.
    pub fn special_token(mut self, token: impl Into<String>) -> Self {
        self.special_tokens.push(token.into());
        self
    }

    pub fn special_tokens<S: Into<String>>(mut self, tokens: impl IntoIterator<Item = S>) -> Self {
        self.special_tokens.extend(tokens.into_iter().map(Into::into));
        self
    }

    /// Build the tokenizer.
    pub fn build(self) -> Result<Tokenizer> {
        Tokenizer::new(self.vocab, self.merges, &self.special_tokens)
    }
}

/// Byte-level BPE tokenizer.
///
/// Immutable once built; share it freely between threads.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    /// Vocabulary, special tokens included
    vocab: Vocabulary,
    /// Merges in rank order
    merges: MergeTable,
    /// Rank lookup over symbol IDs
    rules: MergeRules,
    /// Symbol ID of every single byte
    byte_symbols: Vec<u32>,
    /// Bytes of symbols that have no vocabulary entry
    extra_symbols: AHashMap<u32, Vec<u8>>,
    /// Special tokens in configured order, duplicates removed
    special_tokens: Vec<String>,
    /// Special-token matcher
    specials: SpecialTokenSplitter,
}

impl Tokenizer {
    /// Create a tokenizer from an in-memory model.
    ///
    /// Special tokens missing from `vocab` are appended after its highest ID,
    /// in the given order.
    pub fn new<S: AsRef<str>>(
        mut vocab: Vocabulary,
        merges: MergeTable,
        special_tokens: &[S],
    ) -> Result<Self> {
        let specials = SpecialTokenSplitter::new(special_tokens)?;

        let mut ordered: Vec<String> = Vec::with_capacity(special_tokens.len());
        for token in special_tokens {
            let token = token.as_ref();
            if token.is_empty() || ordered.iter().any(|t| t == token) {
                continue;
            }
            if vocab.get_id(token.as_bytes()).is_none() {
                let id = vocab.next_id();
                vocab.add_token_with_id(token.as_bytes(), id)?;
                log::debug!("Added special token {:?} with ID {}", token, id);
            }
            ordered.push(token.to_string());
        }

        let mut interner = SymbolInterner::new(&vocab);
        let byte_symbols: Vec<u32> = (0..=u8::MAX).map(|b| interner.intern(&[b])).collect();

        let mut rules = MergeRules::with_capacity(merges.len());
        for (rank, (left, right)) in merges.iter().enumerate() {
            let merged = interner.intern(&[left, right].concat());
            let pair = (interner.intern(left), interner.intern(right));
            rules.add_merge(pair, rank as u32, merged);
        }

        let extra_symbols = interner.into_extra();
        if !extra_symbols.is_empty() {
            log::warn!(
                "{} merge symbols have no vocabulary entry",
                extra_symbols.len()
            );
        }

        Ok(Self {
            vocab,
            merges,
            rules,
            byte_symbols,
            extra_symbols,
            special_tokens: ordered,
            specials,
        })
    }

    /// Create a tokenizer builder.
    pub fn builder() -> TokenizerBuilder {
        TokenizerBuilder::new()
    }

    /// Create a tokenizer from the output of a training run.
    pub fn from_trained(model: TrainedModel) -> Result<Self> {
        Self::new(model.vocab, model.merges, &model.special_tokens)
    }

    /// Load a tokenizer from a vocabulary file and a merges file.
    pub fn from_files<S: AsRef<str>>(
        vocab_path: impl AsRef<Path>,
        merges_path: impl AsRef<Path>,
        special_tokens: &[S],
    ) -> Result<Self> {
        let (vocab, merges) = TokenizerLoader::load(vocab_path, merges_path)?;
        Self::new(vocab, merges, special_tokens)
    }

    /// Save the vocabulary and merges files.
    pub fn save(&self, vocab_path: impl AsRef<Path>, merges_path: impl AsRef<Path>) -> Result<()> {
        TokenizerSaver::new(&self.vocab, &self.merges).save(vocab_path, merges_path)
    }

    /// Encode text to token IDs.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let mut ids = Vec::with_capacity(text.len() / 2 + 1);
        self.encode_into(text, &mut ids)?;
        Ok(ids)
    }

    /// Encode text, appending the IDs to `ids`.
    pub fn encode_into(&self, text: &str, ids: &mut Vec<u32>) -> Result<()> {
        for span in self.specials.split(text) {
            match span {
                Span::Special(token) => {
                    let id = self
                        .vocab
                        .get_id(token.as_bytes())
                        .ok_or_else(|| TokenizerError::UnknownSpecialToken(token.to_string()))?;
                    ids.push(id);
                }
                Span::Plain(plain) => self.encode_bytes(plain.as_bytes(), ids)?,
            }
        }
        Ok(())
    }

    /// Merge the bytes of one plain span and append the resulting IDs.
    fn encode_bytes(&self, bytes: &[u8], ids: &mut Vec<u32>) -> Result<()> {
        let mut symbols: Vec<u32> = bytes
            .iter()
            .map(|&b| self.byte_symbols[b as usize])
            .collect();

        while apply_one_best_merge(&mut symbols, &self.rules) {}

        for symbol in symbols {
            if let Some(bytes) = self.extra_symbols.get(&symbol) {
                return Err(TokenizerError::UnknownByteSymbol(bytes.clone()));
            }
            ids.push(symbol);
        }
        Ok(())
    }

    /// Lazily encode a sequence of chunks.
    ///
    /// Yields the same IDs as encoding each chunk separately and
    /// concatenating the results. Only one chunk's IDs are held at a time.
    /// Iteration stops after the first error.
    pub fn encode_iterable<I>(&self, chunks: I) -> EncodeIter<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        EncodeIter {
            tokenizer: self,
            chunks: chunks.into_iter(),
            pending: Vec::new().into_iter(),
            failed: false,
        }
    }

    /// Encode several texts in parallel. Output order matches input order.
    pub fn encode_batch<S>(&self, texts: &[S]) -> Result<Vec<Vec<u32>>>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.encode(text.as_ref()))
            .collect()
    }

    /// Decode token IDs to raw bytes.
    pub fn decode_bytes(&self, ids: &[u32]) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(ids.len() * 4);
        for &id in ids {
            let token = self
                .vocab
                .get_token(id)
                .ok_or(TokenizerError::UnknownTokenId(id))?;
            bytes.extend_from_slice(token);
        }
        Ok(bytes)
    }

    /// Decode token IDs to text.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD rather than reported.
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        let bytes = self.decode_bytes(ids)?;
        Ok(String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }

    /// Bytes of a token.
    pub fn id_to_token(&self, id: u32) -> Option<&[u8]> {
        self.vocab.get_token(id)
    }

    /// ID of a token.
    pub fn token_to_id(&self, token: &[u8]) -> Option<u32> {
        self.vocab.get_id(token)
    }

    /// Get the vocabulary size.
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    pub fn special_tokens(&self) -> &[String] {
        &self.special_tokens
    }

    /// Get a reference to the vocabulary.
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn merges(&self) -> &MergeTable {
        &self.merges
    }

    pub fn merge_rules(&self) -> &MergeRules {
        &self.rules
    }
}

impl TryFrom<TrainedModel> for Tokenizer {
    type Error = TokenizerError;

    fn try_from(model: TrainedModel) -> Result<Self> {
        Self::from_trained(model)
    }
}

/// Lazy encoder returned by [`Tokenizer::encode_iterable`].
pub struct EncodeIter<'a, I> {
    tokenizer: &'a Tokenizer,
    chunks: I,
    pending: std::vec::IntoIter<u32>,
    failed: bool,
}

impl<'a, I> Iterator for EncodeIter<'a, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(id) = self.pending.next() {
                return Some(Ok(id));
            }
            if self.failed {
                return None;
            }

            let chunk = self.chunks.next()?;
            match self.tokenizer.encode(chunk.as_ref()) {
                Ok(ids) => self.pending = ids.into_iter(),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Assigns symbol IDs to byte strings: vocabulary IDs where they exist,
/// fresh IDs past the vocabulary otherwise.
struct SymbolInterner<'v> {
    vocab: &'v Vocabulary,
    extra: AHashMap<Vec<u8>, u32>,
    next_id: u32,
}

impl<'v> SymbolInterner<'v> {
    fn new(vocab: &'v Vocabulary) -> Self {
        Self {
            vocab,
            extra: AHashMap::new(),
            next_id: vocab.next_id(),
        }
    }

    fn intern(&mut self, bytes: &[u8]) -> u32 {
        if let Some(id) = self.vocab.get_id(bytes) {
            return id;
        }
        if let Some(&id) = self.extra.get(bytes) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.extra.insert(bytes.to_vec(), id);
        id
    }

    fn into_extra(self) -> AHashMap<u32, Vec<u8>> {
        self.extra.into_iter().map(|(bytes, id)| (id, bytes)).collect()
    }
}
