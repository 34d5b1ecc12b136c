//! Encode command implementation.

use super::ModelArgs;
use clap::Parser;
use std::path::PathBuf;

/// Encode command arguments.
#[derive(Parser)]
pub struct EncodeCommand {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Text to encode, or "-" to read stdin
    #[arg(short, long)]
    pub input: String,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Encode line by line instead of holding all IDs in memory
    #[arg(long, default_value_t = false)]
    pub lines: bool,
}

use anyhow::{Context, Result as AnyhowResult};
use bpekit_tokenizer::Tokenizer;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};

pub fn run(cmd: EncodeCommand) -> AnyhowResult<()> {
    let tokenizer = cmd.model.load()?;

    let mut out: Box<dyn Write> = match &cmd.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let count = if cmd.lines {
        let lines: Box<dyn BufRead> = if cmd.input == "-" {
            Box::new(BufReader::new(io::stdin().lock()))
        } else {
            Box::new(io::Cursor::new(cmd.input.into_bytes()))
        };
        encode_lines(&tokenizer, lines, &mut out)?
    } else {
        let text = if cmd.input == "-" {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading stdin")?;
            buffer
        } else {
            cmd.input
        };
        let ids = tokenizer.encode(&text)?;
        write_ids(&mut out, ids.iter().copied())?;
        ids.len()
    };

    writeln!(out)?;
    out.flush()?;

    if let Some(path) = &cmd.output {
        log::info!("Encoded {} tokens to {}", count, path.display());
    }

    Ok(())
}

/// Stream lines (newlines kept) through the tokenizer.
fn encode_lines(
    tokenizer: &Tokenizer,
    mut input: impl BufRead,
    out: &mut dyn Write,
) -> AnyhowResult<usize> {
    let mut read_error = None;
    let lines = std::iter::from_fn(|| {
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(e) => {
                read_error = Some(e);
                None
            }
        }
    });

    let mut count = 0;
    for id in tokenizer.encode_iterable(lines) {
        if count > 0 {
            write!(out, " ")?;
        }
        write!(out, "{}", id?)?;
        count += 1;
    }

    if let Some(e) = read_error {
        return Err(e).context("reading input");
    }
    Ok(count)
}

fn write_ids(out: &mut dyn Write, ids: impl IntoIterator<Item = u32>) -> io::Result<()> {
    for (i, id) in ids.into_iter().enumerate() {
        if i > 0 {
            write!(out, " ")?;
        }
        write!(out, "{}", id)?;
    }
    Ok(())
}
