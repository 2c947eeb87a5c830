//! Per-batch scan summary and statistics

use crate::features::Reconciliation;
use crate::types::scored::{ScoredBatch, Verdict};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Number of probability histogram buckets (0-10%, 10-20%, ...)
pub const SCORE_BUCKETS: usize = 10;

/// What happened to one batch
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub batch_id: Uuid,
    pub scanned_at: DateTime<Utc>,
    /// Records scored
    pub total: usize,
    /// Fully-empty rows discarded before scoring
    pub dropped_empty_rows: usize,
    /// Records predicted fraudulent
    pub flagged: usize,
    pub reconciliation: Reconciliation,
    /// Histogram of positive-class probabilities
    pub score_buckets: [u64; SCORE_BUCKETS],
    pub mean_probability_pct: f64,
    pub max_probability_pct: f64,
    pub elapsed_us: u64,
    pub verdict: Verdict,
    pub message: String,
}

/// Histogram bucket of a percentage in [0, 100]
fn bucket(pct: f64) -> usize {
    ((pct / 100.0) * SCORE_BUCKETS as f64).min((SCORE_BUCKETS - 1) as f64) as usize
}

impl ScanSummary {
    pub fn new(
        scored: &ScoredBatch,
        dropped_empty_rows: usize,
        reconciliation: Reconciliation,
        elapsed: Duration,
    ) -> Self {
        let mut score_buckets = [0u64; SCORE_BUCKETS];
        let mut sum = 0.0;
        let mut max = 0.0f64;
        for record in scored.records() {
            score_buckets[bucket(record.probability_pct)] += 1;
            sum += record.probability_pct;
            max = max.max(record.probability_pct);
        }

        let total = scored.len();
        let verdict = scored.verdict();

        Self {
            batch_id: Uuid::new_v4(),
            scanned_at: Utc::now(),
            total,
            dropped_empty_rows,
            flagged: scored.fraud_count(),
            reconciliation,
            score_buckets,
            mean_probability_pct: if total > 0 { sum / total as f64 } else { 0.0 },
            max_probability_pct: max,
            elapsed_us: elapsed.as_micros() as u64,
            verdict,
            message: verdict.to_string(),
        }
    }

    /// Share of records flagged, in percent
    pub fn fraud_rate(&self) -> f64 {
        if self.total > 0 {
            (self.flagged as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Log the summary as a block of info lines
    pub fn log(&self) {
        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║                 FRAUD SCAN - BATCH SUMMARY                   ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Batch: {}", self.batch_id);
        info!(
            "║ Records Scored: {:>8}  │  Empty Rows Dropped: {:>8}",
            self.total, self.dropped_empty_rows
        );
        info!(
            "║ Flagged:        {:>8}  │  Fraud Rate: {:>6.2}%",
            self.flagged,
            self.fraud_rate()
        );
        info!(
            "║ Scaling Applied: {:<5}  │  Scoring Time: {} μs",
            self.reconciliation.scaling_applied, self.elapsed_us
        );
        if !self.reconciliation.synthesized.is_empty() {
            info!(
                "║ Zero-filled Features: {}",
                self.reconciliation.synthesized.join(", ")
            );
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Fraud Probability Distribution:");
        for (i, &count) in self.score_buckets.iter().enumerate() {
            let pct = if self.total > 0 {
                (count as f64 / self.total as f64) * 100.0
            } else {
                0.0
            };
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:>3}-{:<3}%: {:>6} ({:>5.1}%) {}",
                i * 10,
                (i + 1) * 10,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}
