//! Plain-text tables for the terminal

use crate::types::batch::Record;
use crate::types::scored::ScoredBatch;

/// Marker in front of the highest-probability fraud rows
pub const TOP_MARKER: &str = "*";

/// Lay out `header` and `rows` as left-aligned columns separated by two
/// spaces. Every line gets a one-character gutter for row markers.
fn table(header: &[String], rows: &[(bool, Vec<String>)]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for (_, cells) in rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |gutter: &str, cells: &[String]| {
        let body: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{:<width$}", cell, width = width))
            .collect();
        format!("{} {}", gutter, body.join("  ").trim_end())
    };

    let mut out = line(" ", header);
    out.push('\n');
    for (marked, cells) in rows {
        out.push_str(&line(if *marked { TOP_MARKER } else { " " }, cells));
        out.push('\n');
    }
    out
}

/// First rows of an upload, as uploaded
pub fn preview(columns: &[String], records: &[Record]) -> String {
    let rows: Vec<(bool, Vec<String>)> = records
        .iter()
        .map(|r| (false, r.fields().to_vec()))
        .collect();
    table(columns, &rows)
}

/// The records predicted fraudulent, laid out like the report.
///
/// Every row holding the highest probability is marked.
pub fn fraud_table(scored: &ScoredBatch) -> String {
    let layout = scored.layout();
    let top = scored
        .frauds()
        .map(|r| r.probability_pct)
        .fold(f64::NEG_INFINITY, f64::max);

    let rows: Vec<(bool, Vec<String>)> = scored
        .frauds()
        .map(|r| (r.probability_pct == top, layout.row(r)))
        .collect();

    table(layout.header(), &rows)
}
