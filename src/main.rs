//! Fraud Batch Scorer - Main Entry Point
//!
//! Previews uploaded transaction CSVs, scores them against the pre-trained
//! model artifacts, and writes the annotated report.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fraud_batch_scorer::{
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    export::DEFAULT_REPORT_PATH,
    ingest, render, runner, BatchScorer, ModelBundle,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fraud-scan", version, about = "Score transaction batches for fraud")]
struct Args {
    /// Configuration file (optional; environment overrides apply either way)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the first rows of a batch without scoring it
    Preview {
        /// CSV file, or `-` for stdin
        input: PathBuf,

        /// Rows to show (defaults to scoring.preview_rows)
        #[arg(long)]
        rows: Option<usize>,
    },
    /// Score one or more batches and write the full report
    Scan {
        /// CSV files, or `-` for stdin
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Report path; with several inputs each report gets the input's name as suffix
        #[arg(long, short, default_value = DEFAULT_REPORT_PATH)]
        output: PathBuf,

        /// Also write the scan summary as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
    },
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fraud_batch_scorer={0},fraud_scan={0}", logging.level)));

    if logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn preview(config: &AppConfig, input: &Path, rows: Option<usize>) -> Result<()> {
    let batch = ingest::read_path(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let rows = rows.unwrap_or(config.scoring.preview_rows);

    println!("Data preview ({} of {} rows):", rows.min(batch.len()), batch.len());
    print!("{}", render::preview(batch.columns(), batch.head(rows)));
    Ok(())
}

fn scan(config: &AppConfig, inputs: &[PathBuf], output: &Path, summary: Option<&Path>) -> Result<bool> {
    let bundle = match ModelBundle::load(&config.models) {
        Ok(bundle) => Arc::new(bundle),
        Err(e) if e.is_fatal() => {
            error!(error = %e, "Failed to load model artifacts");
            eprintln!("Error: {}", e);
            return Ok(false);
        }
        Err(e) => return Err(e).context("Failed to load model artifacts"),
    };
    info!(
        features = bundle.schema().len(),
        backend = bundle.classifier().name(),
        threshold = config.scoring.decision_threshold,
        "Model bundle ready"
    );

    let scorer = BatchScorer::new(bundle, config.scoring.clone());
    let runs = runner::scan_inputs(&scorer, inputs, output, summary);

    let mut failed = 0usize;
    for run in &runs {
        match &run.result {
            Ok(outcome) => {
                println!("{}: {}", run.input.display(), outcome.summary.verdict);
                if outcome.scored.fraud_count() > 0 {
                    print!("{}", render::fraud_table(&outcome.scored));
                }
                println!("Full report: {}", run.report.display());
            }
            Err(e) => {
                failed += 1;
                eprintln!("Error: {:#}", e);
            }
        }
    }

    if failed > 0 {
        warn!(failed = failed, total = inputs.len(), "Some batches were not scored");
    }
    Ok(failed == 0)
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = AppConfig::load_from_path(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    init_logging(&config.logging);

    let ok = match &args.command {
        Command::Preview { input, rows } => {
            preview(&config, input, *rows)?;
            true
        }
        Command::Scan {
            inputs,
            output,
            summary,
        } => scan(&config, inputs, output, summary.as_deref())?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_scan() {
        let args = Args::parse_from(["fraud-scan", "scan", "a.csv", "b.csv", "--summary", "s.json"]);
        match args.command {
            Command::Scan {
                inputs,
                output,
                summary,
            } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(output, PathBuf::from(DEFAULT_REPORT_PATH));
                assert_eq!(summary, Some(PathBuf::from("s.json")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
