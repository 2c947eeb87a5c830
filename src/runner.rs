//! Scanning several uploads in one run.
//!
//! A failing upload is logged and skipped; the remaining uploads are still
//! scored.

use crate::export;
use crate::ingest::{self, STDIN_PATH};
use crate::scorer::{BatchScorer, ScanOutcome};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One upload of a run and what became of it
#[derive(Debug)]
pub struct InputScan {
    pub input: PathBuf,
    pub report: PathBuf,
    pub result: Result<ScanOutcome>,
}

/// `base` with `_<tag>` inserted before the extension
fn suffixed(base: &Path, tag: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{}_{}.{}", stem, tag, ext.to_string_lossy()),
        None => format!("{}_{}", stem, tag),
    };
    base.with_file_name(name)
}

fn input_tag(input: &Path) -> String {
    if input.as_os_str() == STDIN_PATH {
        return "stdin".to_string();
    }
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string())
}

/// Output path for each input.
///
/// A single input writes to `base` itself. Several inputs each get their file
/// stem as suffix; repeated stems get a counter so no two inputs share a path.
pub fn output_paths(base: &Path, inputs: &[PathBuf]) -> Vec<PathBuf> {
    if inputs.len() == 1 {
        return vec![base.to_path_buf()];
    }

    let mut taken = HashSet::with_capacity(inputs.len());
    inputs
        .iter()
        .map(|input| {
            let tag = input_tag(input);
            let mut path = suffixed(base, &tag);
            let mut n = 2;
            while taken.contains(&path) {
                path = suffixed(base, &format!("{}_{}", tag, n));
                n += 1;
            }
            taken.insert(path.clone());
            path
        })
        .collect()
}

/// Read, score and export one upload
pub fn scan_input(
    scorer: &BatchScorer,
    input: &Path,
    report: &Path,
    summary: Option<&Path>,
) -> Result<ScanOutcome> {
    let batch = ingest::read_path(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let outcome = scorer
        .scan(&batch)
        .with_context(|| format!("Failed to score {}", input.display()))?;

    export::write_report_file(report, &outcome.scored)
        .with_context(|| format!("Failed to write report {}", report.display()))?;

    if let Some(path) = summary {
        let file = File::create(path)
            .with_context(|| format!("Failed to create summary {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &outcome.summary)
            .with_context(|| format!("Failed to write summary {}", path.display()))?;
    }

    outcome.summary.log();
    Ok(outcome)
}

/// Scan every input in order
pub fn scan_inputs(
    scorer: &BatchScorer,
    inputs: &[PathBuf],
    output: &Path,
    summary: Option<&Path>,
) -> Vec<InputScan> {
    let reports = output_paths(output, inputs);
    let summaries: Vec<Option<PathBuf>> = match summary {
        Some(base) => output_paths(base, inputs).into_iter().map(Some).collect(),
        None => vec![None; inputs.len()],
    };

    inputs
        .iter()
        .zip(reports)
        .zip(summaries)
        .map(|((input, report), summary)| {
            let result = scan_input(scorer, input, &report, summary.as_deref());
            if let Err(e) = &result {
                let reason = format!("{:#}", e);
                warn!(input = %input.display(), error = %reason, "Batch skipped");
            }
            InputScan {
                input: input.clone(),
                report,
                result,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_single_input_keeps_base_path() {
        let out = output_paths(Path::new("report.csv"), &paths(&["data/june.csv"]));
        assert_eq!(out, paths(&["report.csv"]));
    }

    #[test]
    fn test_several_inputs_get_stem_suffix() {
        let out = output_paths(
            Path::new("out/fraud_detection_report.csv"),
            &paths(&["data/june.csv", "-"]),
        );
        assert_eq!(
            out,
            paths(&[
                "out/fraud_detection_report_june.csv",
                "out/fraud_detection_report_stdin.csv"
            ])
        );
    }

    #[test]
    fn test_repeated_stems_do_not_collide() {
        let out = output_paths(
            Path::new("report"),
            &paths(&["a/june.csv", "b/june.csv", "-", "-"]),
        );
        assert_eq!(
            out,
            paths(&["report_june", "report_june_2", "report_stdin", "report_stdin_2"])
        );
    }
}
