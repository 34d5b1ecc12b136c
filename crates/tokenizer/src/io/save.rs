//! Save functionality for trained tokenizers.

use super::escape::{escape_token, Field};
use bpekit_core::{MergeTable, Result, TokenizerError, Vocabulary};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Tokenizer saver - writes vocabulary and merges files.
pub struct TokenizerSaver<'a> {
    /// Vocabulary reference
    vocab: &'a Vocabulary,
    /// Merge table reference
    merges: &'a MergeTable,
}

impl<'a> TokenizerSaver<'a> {
    /// Create a new tokenizer saver.
    pub fn new(vocab: &'a Vocabulary, merges: &'a MergeTable) -> Self {
        Self { vocab, merges }
    }

    /// Write both files, creating parent directories as needed.
    pub fn save(&self, vocab_path: impl AsRef<Path>, merges_path: impl AsRef<Path>) -> Result<()> {
        self.save_vocab(vocab_path)?;
        self.save_merges(merges_path)
    }

    /// Write the vocabulary file, one `<id>\t<token>` line per entry.
    pub fn save_vocab(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = create(path)?;

        for (id, token) in self.vocab.entries() {
            writeln!(writer, "{}\t{}", id, escape_token(token, Field::Vocab))
                .map_err(|e| TokenizerError::io(path, e))?;
        }
        writer.flush().map_err(|e| TokenizerError::io(path, e))?;

        log::debug!("Wrote {} vocabulary entries to {}", self.vocab.len(), path.display());
        Ok(())
    }

    /// Write the merges file, one `<left> <right>` line per merge in rank order.
    pub fn save_merges(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = create(path)?;

        for (left, right) in self.merges.iter() {
            writeln!(
                writer,
                "{} {}",
                escape_token(left, Field::Merge),
                escape_token(right, Field::Merge)
            )
            .map_err(|e| TokenizerError::io(path, e))?;
        }
        writer.flush().map_err(|e| TokenizerError::io(path, e))?;

        log::debug!("Wrote {} merges to {}", self.merges.len(), path.display());
        Ok(())
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| TokenizerError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| TokenizerError::io(path, e))?;
    Ok(BufWriter::new(file))
}
