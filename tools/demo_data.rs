//! Demo Data Generator
//!
//! Writes a synthetic transaction batch shaped like the card-fraud dataset
//! (Time, V1..Vn, Amount, Class) and, optionally, a matching set of model
//! artifacts so `fraud-scan` can be tried end to end.

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "demo_data", about = "Generate a synthetic transaction batch")]
struct Args {
    /// Output CSV path
    #[arg(long, short, default_value = "demo_transactions.csv")]
    output: PathBuf,

    /// Number of transactions
    #[arg(long, default_value_t = 1000)]
    count: usize,

    /// Share of fraudulent transactions
    #[arg(long, default_value_t = 0.02)]
    fraud_rate: f64,

    /// Number of anonymized V features
    #[arg(long, default_value_t = 28)]
    features: usize,

    /// RNG seed for reproducible batches
    #[arg(long)]
    seed: Option<u64>,

    /// Also write demo artifacts (features.json, scaler.json, fraud_model.json) here
    #[arg(long)]
    models_dir: Option<PathBuf>,
}

/// V features that separate the classes
const SIGNAL_FEATURES: usize = 4;

/// Shift applied to the signal features of fraudulent rows
const FRAUD_SHIFT: f64 = 3.0;

struct TransactionGenerator {
    rng: StdRng,
    features: usize,
    clock: f64,
}

impl TransactionGenerator {
    fn new(features: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            features,
            clock: 0.0,
        }
    }

    /// Roughly standard-normal value (sum of uniforms)
    fn noise(&mut self) -> f64 {
        (0..12).map(|_| self.rng.gen::<f64>()).sum::<f64>() - 6.0
    }

    fn generate(&mut self, fraud: bool) -> Vec<String> {
        self.clock += self.rng.gen_range(0.0..10.0);

        let mut row = Vec::with_capacity(self.features + 3);
        row.push(format!("{:.0}", self.clock));

        for i in 0..self.features {
            let mut v = self.noise();
            if fraud && i < SIGNAL_FEATURES {
                v += FRAUD_SHIFT;
            }
            row.push(format!("{:.6}", v));
        }

        let amount = if fraud {
            self.rng.gen_range(1.0..2000.0)
        } else {
            self.rng.gen_range(1.0..250.0)
        };
        row.push(format!("{:.2}", amount));
        row.push(u8::from(fraud).to_string());
        row
    }
}

fn header(features: usize) -> Vec<String> {
    let mut header = vec!["Time".to_string()];
    header.extend((1..=features).map(|i| format!("V{}", i)));
    header.push("Amount".to_string());
    header.push("Class".to_string());
    header
}

/// Mean and population standard deviation of one column
fn moments(rows: &[Vec<String>], col: usize) -> (f64, f64) {
    let values: Vec<f64> = rows
        .iter()
        .filter_map(|r| r[col].parse::<f64>().ok())
        .collect();
    let n = values.len().max(1) as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    (mean, if std > 0.0 { std } else { 1.0 })
}

fn write_artifacts(dir: &Path, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    // Every column except the label is a feature
    let features = &header[..header.len() - 1];
    let amount_col = features.len() - 1;

    let (time_mean, time_std) = moments(rows, 0);
    let (amount_mean, amount_std) = moments(rows, amount_col);

    let coefficients: Vec<f64> = (0..features.len())
        .map(|i| if (1..=SIGNAL_FEATURES).contains(&i) { 1.5 } else { 0.0 })
        .collect();
    let intercept = -1.5 * FRAUD_SHIFT * SIGNAL_FEATURES as f64 / 2.0 - 1.0;

    let artifacts = [
        ("features.json", json!(features)),
        (
            "scaler.json",
            json!({
                "kind": "standard",
                "columns": ["Time", "Amount"],
                "mean": [time_mean, amount_mean],
                "scale": [time_std, amount_std],
            }),
        ),
        (
            "fraud_model.json",
            json!({
                "kind": "logistic",
                "coefficients": coefficients,
                "intercept": intercept,
            }),
        ),
    ];

    for (name, value) in artifacts {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(&value)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Artifact written");
    }

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("demo_data=info".parse()?),
        )
        .init();

    let args = Args::parse();
    anyhow::ensure!(
        (0.0..=1.0).contains(&args.fraud_rate),
        "--fraud-rate must be in [0, 1]"
    );
    info!(
        output = %args.output.display(),
        count = args.count,
        fraud_rate = args.fraud_rate,
        features = args.features,
        "Generating demo batch"
    );

    let mut generator = TransactionGenerator::new(args.features, args.seed);
    let mut fraud_count = 0;
    let rows: Vec<Vec<String>> = (0..args.count)
        .map(|_| {
            let fraud = generator.rng.gen_bool(args.fraud_rate);
            fraud_count += usize::from(fraud);
            generator.generate(fraud)
        })
        .collect();

    let header = header(args.features);
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    wtr.write_record(&header)?;
    for row in &rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;

    info!(
        "Completed! Wrote {} transactions ({} legitimate, {} fraudulent)",
        args.count,
        args.count - fraud_count,
        fraud_count
    );

    if let Some(dir) = &args.models_dir {
        write_artifacts(dir, &header, &rows)?;
    }

    Ok(())
}
