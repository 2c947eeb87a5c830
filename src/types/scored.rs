//! Scored records and the batch verdict

use super::batch::{Record, TransactionBatch};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Header of the appended label column
pub const PREDICTION_COLUMN: &str = "Fraud_Prediction";

/// Header of the appended probability column
pub const PROBABILITY_COLUMN: &str = "Fraud_Probability (%)";

/// Convert a positive-class probability to a percentage with two decimals.
///
/// Rounds half to even on the scaled value, the way numpy's `round` does.
pub fn probability_pct(probability: f64) -> f64 {
    let pct = ((probability * 100.0) * 100.0).round_ties_even() / 100.0;
    pct.clamp(0.0, 100.0)
}

/// Format a percentage the way Python prints floats: shortest round-trip
/// digits, whole numbers keep a trailing `.0`.
pub fn format_pct(pct: f64) -> String {
    if pct.fract() == 0.0 {
        format!("{:.1}", pct)
    } else {
        pct.to_string()
    }
}

/// A record together with its prediction
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: Record,
    /// Predicted class (1 = fraud)
    pub label: u8,
    /// Positive-class probability in percent, two decimals
    pub probability_pct: f64,
}

impl ScoredRecord {
    pub fn is_fraud(&self) -> bool {
        self.label == 1
    }
}

/// Outcome of a scan, shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "count")]
pub enum Verdict {
    FraudDetected(usize),
    AllClear,
}

impl Verdict {
    pub fn from_count(flagged: usize) -> Self {
        if flagged > 0 {
            Verdict::FraudDetected(flagged)
        } else {
            Verdict::AllClear
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::FraudDetected(n) => write!(f, "{} fraudulent transactions detected!", n),
            Verdict::AllClear => {
                write!(f, "No fraudulent transactions detected in this batch. All clear!")
            }
        }
    }
}

/// Column layout shared by the report and the fraud view.
///
/// Result columns already present in the upload are overwritten in place;
/// otherwise they are appended after the original columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLayout {
    header: Vec<String>,
    prediction: usize,
    probability: usize,
}

impl ResultLayout {
    pub fn new(columns: &[String]) -> Self {
        let mut header = columns.to_vec();

        let mut position_of = |name: &str| {
            header.iter().position(|c| c == name).unwrap_or_else(|| {
                header.push(name.to_string());
                header.len() - 1
            })
        };
        let prediction = position_of(PREDICTION_COLUMN);
        let probability = position_of(PROBABILITY_COLUMN);

        Self {
            header,
            prediction,
            probability,
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Output cells of one record
    pub fn row(&self, record: &ScoredRecord) -> Vec<String> {
        let mut row = record.record.fields().to_vec();
        row.resize(self.header.len(), String::new());
        row[self.prediction] = record.label.to_string();
        row[self.probability] = format_pct(record.probability_pct);
        row
    }
}

/// Every record of a batch with its prediction, in upload order
#[derive(Debug, Clone)]
pub struct ScoredBatch {
    columns: Vec<String>,
    records: Vec<ScoredRecord>,
}

impl ScoredBatch {
    /// Pair each record of `batch` with its prediction.
    ///
    /// `predictions` must hold one `(label, probability_pct)` per record.
    pub fn new(batch: &TransactionBatch, predictions: Vec<(u8, f64)>) -> Self {
        debug_assert_eq!(batch.len(), predictions.len());

        let records = batch
            .records()
            .iter()
            .zip(predictions)
            .map(|(record, (label, probability_pct))| ScoredRecord {
                record: record.clone(),
                label,
                probability_pct,
            })
            .collect();

        Self {
            columns: batch.columns().to_vec(),
            records,
        }
    }

    /// Original columns of the upload
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[ScoredRecord] {
        &self.records
    }

    pub fn layout(&self) -> ResultLayout {
        ResultLayout::new(&self.columns)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records predicted fraudulent
    pub fn frauds(&self) -> impl Iterator<Item = &ScoredRecord> {
        self.records.iter().filter(|r| r.is_fraud())
    }

    pub fn fraud_count(&self) -> usize {
        self.frauds().count()
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_count(self.fraud_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_pct_rounding() {
        assert_eq!(probability_pct(0.123456), 12.35);
        assert_eq!(probability_pct(1.0), 100.0);
        assert_eq!(probability_pct(0.0), 0.0);
        assert_eq!(probability_pct(0.5), 50.0);
    }

    #[test]
    fn test_format_pct() {
        assert_eq!(format_pct(0.0), "0.0");
        assert_eq!(format_pct(100.0), "100.0");
        assert_eq!(format_pct(12.35), "12.35");
        assert_eq!(format_pct(3.5), "3.5");
    }

    #[test]
    fn test_verdict_messages() {
        assert_eq!(
            Verdict::from_count(3).to_string(),
            "3 fraudulent transactions detected!"
        );
        assert_eq!(Verdict::from_count(0), Verdict::AllClear);
        assert!(Verdict::AllClear.to_string().contains("All clear"));
    }

    #[test]
    fn test_verdict_serialization() {
        let json = serde_json::to_string(&Verdict::FraudDetected(2)).unwrap();
        assert_eq!(json, r#"{"status":"fraud_detected","count":2}"#);
    }

    #[test]
    fn test_layout_reuses_existing_result_columns() {
        let columns: Vec<String> = vec![PROBABILITY_COLUMN.into(), "V1".into()];
        let layout = ResultLayout::new(&columns);
        assert_eq!(
            layout.header(),
            [PROBABILITY_COLUMN, "V1", PREDICTION_COLUMN]
        );

        let record = ScoredRecord {
            record: Record::new(vec!["stale".into(), "4".into()]),
            label: 1,
            probability_pct: 88.0,
        };
        assert_eq!(layout.row(&record), ["88.0", "4", "1"]);
    }

    #[test]
    fn test_scored_batch_counts_frauds() {
        let batch = TransactionBatch::new(
            vec!["Amount".into()],
            vec![
                Record::new(vec!["1".into()]),
                Record::new(vec!["2".into()]),
            ],
        );
        let scored = ScoredBatch::new(&batch, vec![(0, 1.5), (1, 97.0)]);

        assert_eq!(scored.len(), 2);
        assert_eq!(scored.fraud_count(), 1);
        assert_eq!(scored.verdict(), Verdict::FraudDetected(1));
        assert_eq!(scored.frauds().next().unwrap().record.get(0), Some("2"));
    }
}
