//! Feature matrix construction for model inference.
//!
//! Reconciles an uploaded batch with the feature schema the classifier was
//! trained on. The steps run in a fixed order:
//!
//! 1. the label column is excluded from the matrix;
//! 2. missing cells become 0;
//! 3. the scaler columns are normalized, but only if all of them are present;
//! 4. schema features absent from the batch are synthesized as zeros;
//! 5. the matrix is cut down to the schema's columns, in schema order.
//!
//! The batch itself is never modified; the matrix is a separate copy.

use crate::config::{ExtraColumnPolicy, MissingFeaturePolicy, ScoringConfig};
use crate::error::{ScoringError, ScoringResult};
use crate::models::{FeatureSchema, Scaler};
use crate::types::batch::{is_missing, TransactionBatch};
use serde::Serialize;
use tracing::{debug, warn};

/// Row-major matrix of model inputs
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    n_rows: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    /// All-zero matrix with the given shape
    pub fn zeros(columns: Vec<String>, n_rows: usize) -> Self {
        let data = vec![0.0; n_rows * columns.len()];
        Self {
            columns,
            n_rows,
            data,
        }
    }

    /// Build from row vectors, each as wide as `columns`
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));

        let n_rows = rows.len();
        let data = rows.into_iter().flatten().collect();
        Self {
            columns,
            n_rows,
            data,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Row-major values
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks(self.n_cols().max(1))
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols() + col]
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        let n_cols = self.n_cols();
        self.data[row * n_cols + col] = value;
    }

    /// Values of a named column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let col = self.columns.iter().position(|c| c == name)?;
        Some((0..self.n_rows).map(|row| self.get(row, col)).collect())
    }
}

/// What reconciliation did to the batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Label column found in the upload and kept out of the matrix
    pub excluded_label: Option<String>,
    /// Whether the scaler columns were normalized
    pub scaling_applied: bool,
    /// Schema features absent from the upload, filled with zeros
    pub synthesized: Vec<String>,
    /// Uploaded columns that are neither features nor the label
    pub ignored: Vec<String>,
}

/// Parse a cell for the matrix: missing and NaN become 0, anything else must
/// be a finite number
fn parse_cell(raw: &str) -> Option<f64> {
    if is_missing(raw) {
        return Some(0.0);
    }
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_nan() => Some(0.0),
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

/// Parse a whole uploaded column
fn numeric_column(batch: &TransactionBatch, index: usize) -> ScoringResult<Vec<f64>> {
    let name = &batch.columns()[index];

    batch
        .records()
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let raw = record.get(index).unwrap_or("");
            parse_cell(raw).ok_or_else(|| {
                ScoringError::malformed(format!(
                    "column {:?}, row {}: {:?} is not a number",
                    name,
                    row + 1,
                    raw
                ))
            })
        })
        .collect()
}

/// Build the schema-conformant matrix for `batch`
pub fn build_matrix(
    batch: &TransactionBatch,
    schema: &FeatureSchema,
    scaler: &Scaler,
    options: &ScoringConfig,
) -> ScoringResult<(FeatureMatrix, Reconciliation)> {
    let label = options.label_column.as_str();
    let mut report = Reconciliation::default();

    // Columns available as features: everything except the label
    let working: Vec<(usize, &str)> = batch
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| {
            if name.as_str() == label {
                report.excluded_label = Some(label.to_string());
                false
            } else {
                true
            }
        })
        .map(|(i, name)| (i, name.as_str()))
        .collect();
    let find = |name: &str| working.iter().find(|(_, c)| *c == name).map(|(i, _)| *i);

    report.synthesized = schema
        .names()
        .iter()
        .filter(|name| find(name).is_none())
        .cloned()
        .collect();
    report.ignored = working
        .iter()
        .filter(|(_, name)| !schema.contains(name))
        .map(|(_, name)| name.to_string())
        .collect();

    if !report.synthesized.is_empty() {
        match options.missing_features {
            MissingFeaturePolicy::Reject => {
                return Err(ScoringError::SchemaMismatch(format!(
                    "missing feature columns: {}",
                    report.synthesized.join(", ")
                )));
            }
            MissingFeaturePolicy::ZeroFill => {
                warn!(
                    missing = ?report.synthesized,
                    "Feature columns absent from batch, filling with zeros"
                );
            }
        }
    }

    if !report.ignored.is_empty() {
        match options.extra_columns {
            ExtraColumnPolicy::Reject => {
                return Err(ScoringError::SchemaMismatch(format!(
                    "unexpected columns: {}",
                    report.ignored.join(", ")
                )));
            }
            ExtraColumnPolicy::Ignore => {
                debug!(columns = ?report.ignored, "Columns excluded from feature matrix");
            }
        }
    }

    // The scaler applies to its whole column set or not at all
    let scaled: Option<Vec<usize>> = scaler.columns().iter().map(|c| find(c)).collect();
    report.scaling_applied = scaled.is_some();
    match &scaled {
        Some(_) => {}
        None if scaler.columns().iter().any(|c| find(c).is_some()) => {
            warn!(
                scaler_columns = ?scaler.columns(),
                "Only part of the scaler columns present, skipping normalization"
            );
        }
        None => debug!("Scaler columns absent, skipping normalization"),
    }

    let mut matrix = FeatureMatrix::zeros(schema.names().to_vec(), batch.len());

    for (col, name) in schema.names().iter().enumerate() {
        let Some(index) = find(name) else {
            continue;
        };

        let mut values = numeric_column(batch, index)?;
        if scaled.is_some() {
            if let Some(position) = scaler.columns().iter().position(|c| c == name) {
                scaler.transform_column(position, &mut values);
                if let Some(row) = values.iter().position(|v| !v.is_finite()) {
                    return Err(ScoringError::malformed(format!(
                        "column {:?}, row {}: {:?} overflows after scaling",
                        name,
                        row + 1,
                        batch.records()[row].get(index).unwrap_or("")
                    )));
                }
            }
        }

        for (row, value) in values.into_iter().enumerate() {
            matrix.set(row, col, value);
        }
    }

    // Scaler columns outside the schema still have to be numeric
    if let Some(indices) = &scaled {
        for (&index, name) in indices.iter().zip(scaler.columns()) {
            if !schema.contains(name) {
                numeric_column(batch, index)?;
            }
        }
    }

    Ok((matrix, report))
}
