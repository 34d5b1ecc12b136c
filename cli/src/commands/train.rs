//! Train command implementation.

use clap::Parser;
use std::path::PathBuf;

/// Train command arguments.
#[derive(Parser)]
pub struct TrainCommand {
    /// Training text files; each is segmented independently
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Where to write the vocabulary file
    #[arg(long)]
    pub vocab_out: PathBuf,

    /// Where to write the merges file
    #[arg(long)]
    pub merges_out: PathBuf,

    /// Target vocabulary size, special tokens and single bytes included
    #[arg(long)]
    pub vocab_size: Option<usize>,

    /// Special token to reserve (repeatable)
    #[arg(long = "special-token")]
    pub special_tokens: Vec<String>,

    /// Split on whitespace instead of the GPT-2 pattern
    #[arg(long, default_value_t = false)]
    pub whitespace: bool,

    /// Minimum pair count for a merge
    #[arg(long)]
    pub min_frequency: Option<u64>,

    /// JSON training configuration; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,
}

use anyhow::{Context, Result as AnyhowResult};
use bpekit_core::SplitPattern;
use bpekit_tokenizer::TokenizerSaver;
use bpekit_training::{BpeTrainer, TrainingConfig};
use std::fs;
use std::time::Instant;

pub fn run(cmd: TrainCommand) -> AnyhowResult<()> {
    let config = build_config(&cmd)?;

    log::info!("Training tokenizer...");
    log::info!("  Inputs: {}", cmd.input.len());
    log::info!("  Vocab size: {}", config.vocab_size);
    log::info!("  Special tokens: {:?}", config.special_tokens);
    log::info!("  Split pattern: {:?}", config.split_pattern);
    log::info!("  Min frequency: {}", config.min_frequency);

    // Read training data
    let start = Instant::now();
    let shards = cmd
        .input
        .iter()
        .map(|path| {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        })
        .collect::<AnyhowResult<Vec<String>>>()?;
    let total: usize = shards.iter().map(String::len).sum();
    log::info!("Read {} bytes in {:.2}s", total, start.elapsed().as_secs_f64());

    // Train
    let start = Instant::now();
    let model = BpeTrainer::new(config)
        .train_from_shards(&shards)
        .context("training failed")?;
    log::info!(
        "Training completed in {:.2}s: {} merges, vocab size {}",
        start.elapsed().as_secs_f64(),
        model.merges.len(),
        model.vocab.len()
    );

    // Save model
    TokenizerSaver::new(&model.vocab, &model.merges)
        .save(&cmd.vocab_out, &cmd.merges_out)
        .context("saving model")?;
    println!(
        "Wrote {} and {}",
        cmd.vocab_out.display(),
        cmd.merges_out.display()
    );

    Ok(())
}

fn build_config(cmd: &TrainCommand) -> AnyhowResult<TrainingConfig> {
    let mut config = match &cmd.config {
        Some(path) => TrainingConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => TrainingConfig::default(),
    };

    if let Some(vocab_size) = cmd.vocab_size {
        config.vocab_size = vocab_size;
    }
    if !cmd.special_tokens.is_empty() {
        config.special_tokens = cmd.special_tokens.clone();
    }
    if cmd.whitespace {
        config.split_pattern = SplitPattern::Whitespace;
    }
    if let Some(min_frequency) = cmd.min_frequency {
        config.min_frequency = min_frequency;
    }

    Ok(config)
}
