//! Benchmark command implementation.

use super::ModelArgs;
use clap::Parser;
use std::path::PathBuf;

/// Benchmark command arguments.
#[derive(Parser)]
pub struct BenchmarkCommand {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Path to input text file for benchmarking
    #[arg(short, long)]
    pub input: PathBuf,

    /// Number of iterations to run
    #[arg(short = 'n', long, default_value_t = 10)]
    pub iterations: usize,
}

use anyhow::{Context, Result as AnyhowResult};
use std::fs;
use std::time::Instant;

pub fn run(cmd: BenchmarkCommand) -> AnyhowResult<()> {
    anyhow::ensure!(cmd.iterations > 0, "--iterations must be at least 1");

    let tokenizer = cmd.model.load()?;

    // Read input text
    let text = fs::read_to_string(&cmd.input)
        .with_context(|| format!("reading {}", cmd.input.display()))?;
    let lines: Vec<&str> = text.split_inclusive('\n').collect();

    println!("Benchmarking encoding...");
    println!("  Text length: {} bytes, {} lines", text.len(), lines.len());
    println!("  Iterations: {}", cmd.iterations);
    println!();

    // Warmup, also checks the round trip once
    let ids: Vec<u32> = tokenizer
        .encode_iterable(lines.iter())
        .collect::<Result<_, _>>()?;
    anyhow::ensure!(
        tokenizer.decode(&ids)? == text,
        "decode(encode(text)) differs from the input"
    );

    // Sequential
    let start = Instant::now();
    for _ in 0..cmd.iterations {
        for line in &lines {
            tokenizer.encode(line)?;
        }
    }
    let sequential = start.elapsed();

    // Parallel over lines
    let start = Instant::now();
    for _ in 0..cmd.iterations {
        tokenizer.encode_batch(&lines)?;
    }
    let parallel = start.elapsed();

    // Decode
    let start = Instant::now();
    for _ in 0..cmd.iterations {
        tokenizer.decode(&ids)?;
    }
    let decode = start.elapsed();

    let bytes = (text.len() * cmd.iterations) as f64;
    let tokens = (ids.len() * cmd.iterations) as f64;

    println!("Results:");
    println!(
        "  Tokens: {} ({:.2} bytes/token)",
        ids.len(),
        text.len() as f64 / ids.len().max(1) as f64
    );
    for (label, elapsed) in [
        ("encode", sequential),
        ("encode_batch", parallel),
        ("decode", decode),
    ] {
        let secs = elapsed.as_secs_f64().max(f64::EPSILON);
        println!(
            "  {:<13} {:>8.3}ms/iter  {:>10.2} MB/s  {:>12.0} tokens/s",
            label,
            secs * 1_000.0 / cmd.iterations as f64,
            bytes / secs / 1_000_000.0,
            tokens / secs
        );
    }

    Ok(())
}
