//! CSV export of scored batches

use crate::error::ScoringResult;
use crate::types::scored::ScoredBatch;
use csv::{Terminator, WriterBuilder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Default file name of the full report
pub const DEFAULT_REPORT_PATH: &str = "fraud_detection_report.csv";

/// Write every scored record as UTF-8 CSV: original cells first, then the
/// predicted label and probability
pub fn write_report<W: Write>(writer: W, scored: &ScoredBatch) -> ScoringResult<()> {
    let mut wtr = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    let layout = scored.layout();
    wtr.write_record(layout.header())?;

    for record in scored.records() {
        wtr.write_record(layout.row(record))?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the report to `path`
pub fn write_report_file<P: AsRef<Path>>(path: P, scored: &ScoredBatch) -> ScoringResult<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_report(BufWriter::new(file), scored)?;

    info!(
        path = %path.display(),
        records = scored.len(),
        "Report written"
    );

    Ok(())
}

/// Render the report in memory
pub fn report_to_string(scored: &ScoredBatch) -> ScoringResult<String> {
    let mut buf = Vec::new();
    write_report(&mut buf, scored)?;
    // Every cell came from valid UTF-8 input or was generated here
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
