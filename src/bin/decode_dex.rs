//! Decode DEX transmissions and print their ingestion reports.
//!
//! Usage:
//!   decode_dex [OPTIONS] [FILE.dex ...]
//!   decode_dex < file.dex
//!
//! Options:
//!   --config, -c FILE   Parser configuration (JSON)
//!   --human, -H         Human-readable output instead of JSON
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `warn`).
//! Exit code 1 if any input ends in `FatalFailure` or cannot be read.

use anyhow::Context;
use dexaudit::render::render_report;
use dexaudit::{DexParser, IngestionReport, IngestionStatus, ParserConfig};
use std::io::{self, Read};
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy)]
enum OutputStyle {
    Json,
    Human,
}

fn print_report(name: &str, report: &IngestionReport, style: OutputStyle) -> anyhow::Result<()> {
    match style {
        OutputStyle::Json => println!("{}", report.to_json()?),
        OutputStyle::Human => {
            println!("== {}", name);
            print!("{}", render_report(report));
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let style = if let Some(pos) = args.iter().position(|a| a == "--human" || a == "-H") {
        args.remove(pos);
        OutputStyle::Human
    } else {
        OutputStyle::Json
    };
    let config = if let Some(pos) = args.iter().position(|a| a == "--config" || a == "-c") {
        args.remove(pos);
        if pos >= args.len() {
            anyhow::bail!("--config needs a file argument");
        }
        let path = args.remove(pos);
        ParserConfig::from_path(Path::new(&path))
            .with_context(|| format!("loading configuration {}", path))?
    } else {
        ParserConfig::default()
    };
    let parser = DexParser::new(config);

    let mut failed = false;
    if args.is_empty() {
        let mut bytes = Vec::new();
        io::stdin().read_to_end(&mut bytes)?;
        let report = parser.parse_bytes(&bytes);
        failed |= report.status == IngestionStatus::FatalFailure;
        print_report("<stdin>", &report, style)?;
    } else {
        for path in &args {
            let bytes = match std::fs::read(path) {
                Ok(b) => b,
                Err(e) => {
                    eprintln!("{}: {}", path, e);
                    failed = true;
                    continue;
                }
            };
            let report = parser.parse_bytes(&bytes);
            if report.status == IngestionStatus::FatalFailure {
                eprintln!("{}: fatal", path);
                failed = true;
            }
            print_report(path, &report, style)?;
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
