use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use pipe8_rs::asm::assemble;
use pipe8_rs::loader::image_from_words;

#[derive(Parser, Debug)]
#[command(author, version, about = "pipe8 assembler: text to a raw big-endian word image")]
struct Opts {
    /// Input assembly file (one instruction per line)
    #[arg(short, long)]
    input: PathBuf,
    /// Output image
    #[arg(short, long)]
    output: PathBuf,
    /// Also print each word with its source line
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    let src = fs::read_to_string(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;
    let words = assemble(&src)?;
    anyhow::ensure!(
        words.len() <= pipe8_rs::memory::INSTRUCTION_MEMORY_SIZE,
        "program has {} words, instruction memory holds {}",
        words.len(),
        pipe8_rs::memory::INSTRUCTION_MEMORY_SIZE
    );
    if opts.verbose {
        for (addr, w) in words.iter().enumerate() {
            println!("{addr:#06x}: {w:04x}  {}", pipe8_rs::disasm::fmt_word(*w));
        }
    }
    fs::write(&opts.output, image_from_words(&words))
        .with_context(|| format!("writing {}", opts.output.display()))?;
    println!("wrote {} words to {}", words.len(), opts.output.display());
    Ok(())
}
