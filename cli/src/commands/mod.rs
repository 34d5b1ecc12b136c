//! CLI commands for the bpekit tokenizer.

pub mod benchmark;
pub mod decode;
pub mod encode;
pub mod train;

pub use benchmark::BenchmarkCommand;
pub use decode::DecodeCommand;
pub use encode::EncodeCommand;
pub use train::TrainCommand;

use anyhow::{Context, Result};
use bpekit_tokenizer::Tokenizer;
use clap::Args;
use std::path::PathBuf;

/// Arguments locating a saved tokenizer.
#[derive(Args)]
pub struct ModelArgs {
    /// Vocabulary file (`<id>\t<token>` per line)
    #[arg(long)]
    pub vocab: PathBuf,

    /// Merges file (`<left> <right>` per line)
    #[arg(long)]
    pub merges: PathBuf,

    /// Special token to keep whole (repeatable)
    #[arg(long = "special-token")]
    pub special_tokens: Vec<String>,
}

impl ModelArgs {
    pub fn load(&self) -> Result<Tokenizer> {
        Tokenizer::from_files(&self.vocab, &self.merges, &self.special_tokens).with_context(|| {
            format!(
                "loading tokenizer from {} and {}",
                self.vocab.display(),
                self.merges.display()
            )
        })
    }
}
