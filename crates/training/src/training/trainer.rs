//! BPE trainer implementation.
//!
//! Training works on the raw bytes of each pre-token. The vocabulary starts
//! with the special tokens followed by all 256 single bytes, and every merge
//! appends the concatenation of the chosen pair. The pair to merge is always
//! the most frequent one; equally frequent pairs are decided by comparing
//! `(left, right)` byte-wise and taking the greatest.

use super::counter::{PreTokenCounter, PreTokenTable};
use super::index::PairIndex;
use ahash::AHashSet;
use bpekit_core::{
    MergeCandidate, MergeTable, Pair, PairPriorityQueue, Result, SplitPattern, Splitter,
    TokenizerError, Vocabulary, BYTE_ALPHABET,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Configuration for BPE training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Target vocabulary size, special tokens and single bytes included
    pub vocab_size: usize,
    /// Special tokens, reserved at the lowest IDs in this order
    pub special_tokens: Vec<String>,
    /// How the corpus is segmented into pre-tokens
    pub split_pattern: SplitPattern,
    /// Minimum frequency for a pair to be merged
    pub min_frequency: u64,
    /// Whether to segment corpus shards in parallel
    pub parallel: bool,
    /// Emit a progress line every this many merges (0 disables)
    pub log_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            vocab_size: 30_000,
            special_tokens: Vec::new(),
            split_pattern: SplitPattern::Gpt2,
            min_frequency: 1,
            parallel: true,
            log_every: 1_000,
        }
    }
}

impl TrainingConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TokenizerError::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_vocab_size(mut self, vocab_size: usize) -> Self {
        self.vocab_size = vocab_size;
        self
    }

    pub fn with_special_tokens<S: Into<String>>(
        mut self,
        special_tokens: impl IntoIterator<Item = S>,
    ) -> Self {
        self.special_tokens = special_tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_split_pattern(mut self, split_pattern: SplitPattern) -> Self {
        self.split_pattern = split_pattern;
        self
    }

    pub fn with_min_frequency(mut self, min_frequency: u64) -> Self {
        self.min_frequency = min_frequency;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }

    /// Number of merges the vocabulary has room for.
    pub fn merge_budget(&self, special_tokens: usize) -> usize {
        self.vocab_size
            .saturating_sub(special_tokens)
            .saturating_sub(BYTE_ALPHABET)
    }
}

/// Result of a training run.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    /// Specials, then single bytes, then one entry per merge
    pub vocab: Vocabulary,
    /// Merges in the order they were learned
    pub merges: MergeTable,
    /// Special tokens as reserved, duplicates removed
    pub special_tokens: Vec<String>,
}

/// BPE trainer.
///
/// Trains a byte-level BPE vocabulary by repeatedly merging the most
/// frequent adjacent pair of symbols.
#[derive(Debug, Clone, Default)]
pub struct BpeTrainer {
    config: TrainingConfig,
}

impl BpeTrainer {
    /// Create a new BPE trainer with the given configuration.
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Create a new BPE trainer with default configuration.
    pub fn with_vocab_size(vocab_size: usize) -> Self {
        Self::new(TrainingConfig::default().with_vocab_size(vocab_size))
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train on a single corpus string.
    pub fn train(&self, corpus: &str) -> Result<TrainedModel> {
        self.train_from_shards(&[corpus])
    }

    /// Train on a corpus split into independent shards.
    ///
    /// Shards are segmented separately, so a pre-token never spans two of
    /// them. The result does not depend on whether they are processed in
    /// parallel.
    pub fn train_from_shards<S>(&self, shards: &[S]) -> Result<TrainedModel>
    where
        S: AsRef<str> + Sync,
    {
        let special_tokens = prepare_special_tokens(&self.config.special_tokens)?;
        let splitter = Splitter::new(self.config.split_pattern)?;

        let counter = if self.config.parallel && shards.len() > 1 {
            PreTokenCounter::from_shards_parallel(shards, &splitter)?
        } else {
            PreTokenCounter::from_shards_sequential(shards, &splitter)?
        };

        self.train_with_specials(counter, special_tokens)
    }

    /// Train on already counted pre-tokens.
    pub fn train_from_counts(&self, counter: PreTokenCounter) -> Result<TrainedModel> {
        let special_tokens = prepare_special_tokens(&self.config.special_tokens)?;
        self.train_with_specials(counter, special_tokens)
    }

    fn train_with_specials(
        &self,
        counter: PreTokenCounter,
        special_tokens: Vec<String>,
    ) -> Result<TrainedModel> {
        let vocab = Vocabulary::byte_level(&special_tokens)?;
        let budget = self.config.merge_budget(special_tokens.len());

        log::info!(
            "Starting BPE training: {} distinct pre-tokens ({} total), {} special tokens, merge budget {}",
            counter.distinct(),
            counter.total_occurrences(),
            special_tokens.len(),
            budget
        );

        let table = counter.into_table(special_tokens.len() as u32);
        let mut run = TrainingRun::new(vocab, table, budget);

        while run.merges.len() < budget {
            if run.step(self.config.min_frequency)?.is_none() {
                break;
            }

            if self.config.log_every > 0 && run.merges.len() % self.config.log_every == 0 {
                log::debug!(
                    "{} / {} merges, {} live pairs",
                    run.merges.len(),
                    budget,
                    run.index.len()
                );
            }
        }

        log::info!(
            "BPE training finished: {} merges, vocabulary size {}",
            run.merges.len(),
            run.vocab.len()
        );

        Ok(TrainedModel {
            vocab: run.vocab,
            merges: run.merges,
            special_tokens,
        })
    }
}

/// Remove duplicate special tokens (first occurrence wins) and reject ones
/// that cannot be told apart from the byte alphabet.
fn prepare_special_tokens(tokens: &[String]) -> Result<Vec<String>> {
    let mut seen = AHashSet::with_capacity(tokens.len());
    let mut unique = Vec::with_capacity(tokens.len());

    for token in tokens {
        if token.len() <= 1 {
            return Err(TokenizerError::InvalidConfig(format!(
                "Special token {:?} must be longer than one byte",
                token
            )));
        }
        if seen.insert(token.as_str()) {
            unique.push(token.clone());
        } else {
            log::warn!("Ignoring duplicate special token {:?}", token);
        }
    }

    Ok(unique)
}

/// Replace every non-overlapping occurrence of `pair`, scanning left to right.
pub fn merge_sequence(symbols: &[u32], pair: Pair, new_id: u32) -> Vec<u32> {
    let mut merged = Vec::with_capacity(symbols.len());
    let mut i = 0;

    while i < symbols.len() {
        if i + 1 < symbols.len() && symbols[i] == pair.0 && symbols[i + 1] == pair.1 {
            merged.push(new_id);
            i += 2;
        } else {
            merged.push(symbols[i]);
            i += 1;
        }
    }

    merged
}

/// Working state of one training run.
struct TrainingRun {
    vocab: Vocabulary,
    merges: MergeTable,
    table: PreTokenTable,
    index: PairIndex,
    queue: PairPriorityQueue,
    /// Symbol ID -> bytes, dense over the vocabulary
    symbols: Vec<Arc<[u8]>>,
}

impl TrainingRun {
    fn new(vocab: Vocabulary, table: PreTokenTable, budget: usize) -> Self {
        let mut symbols = Vec::with_capacity(vocab.len() + budget);
        symbols.extend(
            vocab
                .entries()
                .into_iter()
                .map(|(_, bytes)| Arc::<[u8]>::from(bytes)),
        );

        let index = PairIndex::build(&table);
        let mut run = Self {
            vocab,
            merges: MergeTable::with_capacity(budget),
            queue: PairPriorityQueue::with_capacity(index.len()),
            table,
            index,
            symbols,
        };
        run.refresh_queue();
        run
    }

    /// Perform the next merge. Returns `None` once nothing is left to merge.
    fn step(&mut self, min_frequency: u64) -> Result<Option<MergeCandidate>> {
        let Some(best) = self.queue.pop() else {
            return Ok(None);
        };
        if best.count < min_frequency {
            return Ok(None);
        }

        let mut token = Vec::with_capacity(best.left.len() + best.right.len());
        token.extend_from_slice(&best.left);
        token.extend_from_slice(&best.right);

        if let Some(existing) = self.vocab.get_id(&token) {
            log::warn!(
                "Merge result {:?} duplicates token {}",
                String::from_utf8_lossy(&token),
                existing
            );
        }

        let new_id = self.vocab.next_id();
        self.vocab.add_token_with_id(&token, new_id)?;
        self.symbols.push(Arc::from(token));
        self.merges.push(best.left.to_vec(), best.right.to_vec());

        self.apply_merge(best.pair, new_id);
        self.refresh_queue();

        Ok(Some(best))
    }

    /// Rewrite every sequence containing `pair`, keeping the index in sync.
    fn apply_merge(&mut self, pair: Pair, new_id: u32) {
        for slot in self.index.slots_containing(pair) {
            let count = self.table.counts[slot];
            let sequence = &mut self.table.sequences[slot];

            self.index.remove_sequence(slot, sequence, count);
            *sequence = merge_sequence(sequence, pair, new_id);
            self.index.add_sequence(slot, sequence, count);
        }
    }

    /// Push fresh candidates for every pair whose count changed.
    fn refresh_queue(&mut self) {
        for pair in self.index.take_dirty() {
            match self.index.count(pair) {
                0 => self.queue.remove(pair),
                count => self.queue.push(MergeCandidate::new(
                    pair,
                    count,
                    Arc::clone(&self.symbols[pair.0 as usize]),
                    Arc::clone(&self.symbols[pair.1 as usize]),
                )),
            }
        }
    }
}
