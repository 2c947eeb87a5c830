//! CSV ingestion of uploaded transaction batches

use crate::error::{ScoringError, ScoringResult};
use crate::types::batch::{Record, TransactionBatch};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, info};

/// Path that reads the batch from stdin
pub const STDIN_PATH: &str = "-";

/// Make header names unique and non-empty.
///
/// Blank names become `Unnamed: <index>`; repeats get `.1`, `.2`, ...
/// suffixes, skipping any name already taken.
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());

    for (index, name) in raw.into_iter().enumerate() {
        let base = if name.is_empty() {
            format!("Unnamed: {}", index)
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while taken.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }

        taken.insert(candidate.clone());
        out.push(candidate);
    }

    out
}

/// Parse a CSV batch with a header row.
///
/// Short rows are padded with missing cells; rows wider than the header are
/// rejected. Fully-empty rows are dropped.
pub fn read_batch<R: Read>(reader: R) -> ScoringResult<TransactionBatch> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let raw_headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if raw_headers.is_empty() || raw_headers.iter().all(String::is_empty) {
        return Err(ScoringError::malformed("no columns to parse from input"));
    }
    let columns = normalize_headers(raw_headers);
    let width = columns.len();

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        if row.len() > width {
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            return Err(ScoringError::malformed(format!(
                "line {}: expected {} fields, saw {}",
                line,
                width,
                row.len()
            )));
        }

        let mut fields: Vec<String> = row.iter().map(str::to_string).collect();
        fields.resize(width, String::new());
        records.push(Record::new(fields));
    }

    let batch = TransactionBatch::new(columns, records);
    debug!(
        columns = batch.columns().len(),
        rows = batch.len(),
        dropped = batch.dropped_rows(),
        "CSV batch parsed"
    );

    Ok(batch)
}

/// Read a batch from a file, or from stdin when `path` is `-`
pub fn read_path<P: AsRef<Path>>(path: P) -> ScoringResult<TransactionBatch> {
    let path = path.as_ref();

    let batch = if path.as_os_str() == STDIN_PATH {
        read_batch(io::stdin().lock())?
    } else {
        read_batch(File::open(path)?)?
    };

    info!(
        source = %path.display(),
        rows = batch.len(),
        columns = batch.columns().len(),
        "Batch loaded"
    );

    Ok(batch)
}
