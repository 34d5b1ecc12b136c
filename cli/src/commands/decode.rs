//! Decode command implementation.

use super::ModelArgs;
use clap::Parser;

/// Decode command arguments.
#[derive(Parser)]
pub struct DecodeCommand {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Token IDs to decode (comma-separated)
    #[arg(short, long)]
    pub tokens: String,
}

use anyhow::{Context, Result as AnyhowResult};

pub fn run(cmd: DecodeCommand) -> AnyhowResult<()> {
    let tokenizer = cmd.model.load()?;
    let ids = parse_ids(&cmd.tokens)?;

    let text = tokenizer.decode(&ids)?;
    println!("{}", text);

    Ok(())
}

fn parse_ids(tokens: &str) -> AnyhowResult<Vec<u32>> {
    tokens
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .with_context(|| format!("invalid token ID {:?}", s))
        })
        .collect()
}
