use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pipe8_rs::loader::{self, LoadError, ProgramFormat};
use pipe8_rs::trace::{dump_state, NullTracer, TextTracer};
use pipe8_rs::{CpuConfig, FetchPolicy, Machine};

/// Exit status when the program file cannot be opened.
const EXIT_PROGRAM_FILE_UNAVAILABLE: u8 = 55;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run a program on the pipe8 pipelined core"
)]
struct Opts {
    /// Program file; prompted for on stdin when omitted
    #[arg(value_name = "PROGRAM")]
    input: Option<PathBuf>,
    /// Treat the program as a raw image of big-endian 16-bit words
    #[arg(long)]
    binary: bool,
    /// JSON CpuConfig to start from
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Stop after N cycles
    #[arg(long, value_name = "N", conflicts_with = "no_cycle_limit")]
    max_cycles: Option<u64>,
    /// Run until the pipeline drains, however long that takes
    #[arg(long)]
    no_cycle_limit: bool,
    /// End fetch at the program length instead of at the first zero word
    #[arg(long)]
    explicit_length: bool,
    /// Suppress the per-cycle trace
    #[arg(short, long)]
    quiet: bool,
    /// Print the final state and summary as JSON
    #[arg(long)]
    json: bool,
}

fn prompt_for_path() -> Result<PathBuf> {
    print!("Enter the file name: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let name = line.trim();
    anyhow::ensure!(!name.is_empty(), "no program file given");
    Ok(PathBuf::from(name))
}

fn load_config(opts: &Opts) -> Result<CpuConfig> {
    let mut cfg = match &opts.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => CpuConfig::default(),
    };
    if opts.no_cycle_limit {
        cfg.max_cycles = None;
    } else if let Some(n) = opts.max_cycles {
        cfg.max_cycles = Some(n);
    }
    if opts.explicit_length {
        cfg.fetch_policy = FetchPolicy::ExplicitLength;
    }
    Ok(cfg)
}

fn run(opts: Opts) -> Result<()> {
    let cfg = load_config(&opts)?;
    let path = match &opts.input {
        Some(p) => p.clone(),
        None => prompt_for_path()?,
    };
    let format = if opts.binary {
        ProgramFormat::RawImage
    } else {
        ProgramFormat::Assembly
    };
    let words = loader::read_program(&path, format)?;

    let mut machine = Machine::new(cfg);
    let stored = machine.load_program(&words);
    tracing::info!(path = %path.display(), words = words.len(), stored, "program loaded");

    let summary = if opts.quiet || opts.json {
        machine.run(&mut NullTracer)
    } else {
        let mut tracer = TextTracer::new(io::stdout().lock());
        let summary = machine.run(&mut tracer);
        if let Some(err) = tracer.take_error() {
            return Err(err).context("writing cycle trace");
        }
        summary
    };

    if opts.json {
        let report = serde_json::json!({
            "summary": summary,
            "state": machine.snapshot(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        dump_state(&mut io::stdout().lock(), &summary, &machine.cpu, &machine.mem)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let opts = Opts::parse();
    match run(opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            match err.downcast_ref::<LoadError>() {
                Some(LoadError::ProgramFileUnavailable { .. }) => {
                    ExitCode::from(EXIT_PROGRAM_FILE_UNAVAILABLE)
                }
                _ => ExitCode::FAILURE,
            }
        }
    }
}
