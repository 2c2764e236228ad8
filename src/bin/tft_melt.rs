//! tft-melt: Flatten raw match JSON into relational CSV tables
//!
//! Usage:
//!   # Every *.json match file in a directory, default preset
//!   tft-melt data/raw/matches --output-dir data/clean
//!
//!   # Keep every column of every table
//!   tft-melt data/raw/matches -o data/clean --preset full
//!
//!   # Newline-delimited matches from stdin, custom table definitions
//!   cat matches.jsonl | tft-melt --ndjson --config tables.json -o out

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use std::fs::File;
use std::io::{stdin, BufRead, BufReader};
use std::path::PathBuf;
use tft_melt::{melt_directory, melt_documents, Externals, MeltSummary, NdjsonSource, RuleSet};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tft-melt")]
#[command(about = "Flatten nested match JSON into relational CSV tables", long_about = None)]
struct Args {
    /// Directory of match files, or an NDJSON file with --ndjson (stdin if omitted)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Read newline-delimited JSON (one match per line)
    #[arg(long)]
    ndjson: bool,

    /// Root directory for output; tables go under matches_<region>/
    #[arg(long, short = 'o', default_value = "data/clean")]
    output_dir: PathBuf,

    /// Column preset to apply
    #[arg(long, short = 'p', default_value = "default")]
    preset: String,

    /// Table and preset definitions (JSON); the bundled match tables if omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Value for the partition external (`region` by default) instead of the one derived from match ids
    #[arg(long)]
    region: Option<String>,

    /// Print the available presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let rules = match &args.config {
        Some(path) => RuleSet::from_file(path)?,
        None => RuleSet::builtin()?,
    };

    if args.list_presets {
        for name in rules.preset_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let mut externals = Externals::new();
    if let Some(region) = args.region {
        externals.insert(rules.partition_external().to_string(), Value::String(region));
    }

    let summary = if args.ndjson {
        let reader: Box<dyn BufRead> = match &args.input {
            Some(path) => Box::new(BufReader::new(
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
            )),
            None => Box::new(BufReader::new(stdin())),
        };
        melt_documents(NdjsonSource::new(reader), &rules, &args.preset, externals, &args.output_dir)?
    } else {
        let Some(input) = &args.input else {
            bail!("an input directory is required unless --ndjson is given");
        };
        melt_directory(input, &rules, &args.preset, externals, &args.output_dir)?
    };

    report(&summary);
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tft_melt=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tft_melt=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn report(summary: &MeltSummary) {
    for path in &summary.written {
        println!("{}", path.display());
    }

    eprintln!(
        "Melted {} matches into {} tables (partition {})",
        summary.documents_accepted,
        summary.written.len(),
        summary.partition
    );
    if !summary.errors.is_empty() {
        eprintln!("Skipped {} documents:", summary.errors.len());
        for error in &summary.errors {
            eprintln!("  {}", error);
        }
    }
}
