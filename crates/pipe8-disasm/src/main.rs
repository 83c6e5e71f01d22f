use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::path::PathBuf;

use pipe8_disasm::{build_report, load_image, read_word, Image};
use pipe8_rs::disasm::fmt_word;
use pipe8_rs::loader::ProgramFormat;
use pipe8_rs::FetchPolicy;

#[derive(Parser, Debug)]
#[command(author, version, about = "pipe8 disassembler CLI", long_about = None)]
struct Cli {
    /// Instruction address of the first word
    #[arg(long, default_value = "0", value_parser = parse_u16)]
    base: u16,
    /// Input is a raw image of big-endian words rather than assembly text
    #[arg(long)]
    binary: bool,
    /// Program path
    #[arg(value_name = "PROGRAM")]
    input: PathBuf,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show where the program sits in instruction memory
    Sections,
    /// Disassemble addresses [start, end)
    Range {
        #[arg(value_parser = parse_u16)]
        start: u16,
        #[arg(value_parser = parse_u16)]
        end: u16,
        /// Show the raw word next to each instruction
        #[arg(long)]
        show_words: bool,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Recover blocks and branch edges from entry points
    Analyze {
        /// Entry addresses (hex or dec). Defaults to the image base.
        #[arg(long = "entry", value_name = "ADDR", value_parser = parse_u16)]
        entries: Vec<u16>,
        /// Maximum instructions to visit
        #[arg(long, default_value_t = 10_000usize)]
        max_instr: usize,
        /// Treat zero words as instructions instead of end of program
        #[arg(long)]
        explicit_length: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Print each block's instructions (text format only)
        #[arg(long)]
        listing: bool,
        /// Write analysis output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_u16(s: &str) -> Result<u16> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u16::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u16>()?)
    }
}

fn emit(text: &str, out: Option<PathBuf>) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, text)?,
        None => print!("{text}"),
    }
    Ok(())
}

fn render_range(img: &Image, start: u16, end: u16, show_words: bool) -> String {
    let mut buf = String::new();
    for pc in start..end {
        let Some(raw) = read_word(img, pc) else {
            let _ = writeln!(buf, "{pc:#06x}: <unmapped>");
            break;
        };
        if show_words {
            let _ = writeln!(buf, "{pc:#06x}: {raw:04x}  {}", fmt_word(raw));
        } else {
            let _ = writeln!(buf, "{pc:#06x}: {}", fmt_word(raw));
        }
    }
    buf
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = if cli.binary { ProgramFormat::RawImage } else { ProgramFormat::Assembly };
    let img = load_image(&cli.input, format, cli.base)?;

    match cli.cmd {
        Command::Sections => {
            println!("{:<10} {:<8} {:<8} {:<6} {:<6}", "name", "start", "end", "words", "kind");
            println!(
                "{:<10} {:#06x}   {:#06x}   {:<6} {:<6}",
                "program",
                img.base,
                img.end(),
                img.words.len(),
                img.kind
            );
        }
        Command::Range { start, end, show_words, out } => {
            anyhow::ensure!(end >= start, "end must be >= start");
            emit(&render_range(&img, start, end, show_words), out)?;
        }
        Command::Analyze { entries, max_instr, explicit_length, format, listing, out } => {
            let seeds = if entries.is_empty() { vec![img.base] } else { entries };
            let policy = if explicit_length { FetchPolicy::ExplicitLength } else { FetchPolicy::ZeroTerminated };
            let report = build_report(&img, &seeds, max_instr, policy);

            let text = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&report)? + "\n",
                OutputFormat::Text => {
                    let mut buf = String::new();
                    let _ = writeln!(buf, "Analysis summary:");
                    let _ = writeln!(
                        buf,
                        "  entries   : {:?}",
                        report.entries.iter().map(|a| format!("{a:#06x}")).collect::<Vec<_>>()
                    );
                    let _ = writeln!(buf, "  insts     : {}", report.instructions);
                    let _ = writeln!(buf, "  blocks    : {}", report.blocks.len());
                    let _ = writeln!(buf, "  edges     : {}", report.edges.len());
                    let _ = writeln!(buf, "  functions : {}", report.functions.len());
                    let _ = writeln!(buf, "Edges:");
                    for e in &report.edges {
                        match e.to {
                            Some(to) => {
                                let _ = writeln!(buf, "  {:#06x} -> {to:#06x} ({})", e.from, e.kind);
                            }
                            None => {
                                let _ = writeln!(buf, "  {:#06x} -> ? ({})", e.from, e.kind);
                            }
                        }
                    }
                    if listing {
                        let _ = writeln!(buf, "\nListing:");
                        for b in &report.blocks {
                            let _ = writeln!(buf, "loc_{:04x}:", b.start);
                            for line in &b.insns {
                                let _ = writeln!(buf, "  {line}");
                            }
                        }
                    }
                    buf
                }
            };
            emit(&text, out)?;
        }
    }

    Ok(())
}
