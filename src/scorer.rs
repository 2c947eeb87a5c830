//! Batch scorer: reconcile, normalize, classify, annotate

use crate::config::ScoringConfig;
use crate::error::{ScoringError, ScoringResult};
use crate::features::{self, Reconciliation};
use crate::models::classifier::label_for;
use crate::models::ModelBundle;
use crate::summary::ScanSummary;
use crate::types::batch::TransactionBatch;
use crate::types::scored::{probability_pct, ScoredBatch};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Result of scanning one batch
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub scored: ScoredBatch,
    pub summary: ScanSummary,
}

/// Scores uploaded batches against a shared, read-only model bundle.
///
/// Every call is independent: the same batch and bundle always give the same
/// scored records.
#[derive(Clone)]
pub struct BatchScorer {
    bundle: Arc<ModelBundle>,
    options: ScoringConfig,
}

impl BatchScorer {
    pub fn new(bundle: Arc<ModelBundle>, options: ScoringConfig) -> Self {
        Self { bundle, options }
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn options(&self) -> &ScoringConfig {
        &self.options
    }

    /// Score every record of `batch`.
    ///
    /// The whole batch is scored or none of it is: any error leaves no
    /// partial output.
    pub fn score(&self, batch: &TransactionBatch) -> ScoringResult<(ScoredBatch, Reconciliation)> {
        let bundle = self.bundle.as_ref();
        let (matrix, reconciliation) =
            features::build_matrix(batch, bundle.schema(), bundle.scaler(), &self.options)?;

        debug!(
            rows = matrix.n_rows(),
            features = matrix.n_cols(),
            "Feature matrix built"
        );

        let probabilities = bundle.classifier().predict_proba(&matrix)?;
        if probabilities.len() != batch.len() {
            return Err(ScoringError::Inference(format!(
                "classifier returned {} probabilities for {} records",
                probabilities.len(),
                batch.len()
            )));
        }
        if let Some(bad) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(ScoringError::Inference(format!(
                "classifier returned probability {} outside [0, 1]",
                bad
            )));
        }

        let threshold = self.options.decision_threshold;
        let predictions = probabilities
            .into_iter()
            .map(|p| (label_for(p, threshold), probability_pct(p)))
            .collect();

        Ok((ScoredBatch::new(batch, predictions), reconciliation))
    }

    /// Score `batch` and summarize the result
    pub fn scan(&self, batch: &TransactionBatch) -> ScoringResult<ScanOutcome> {
        let start = Instant::now();
        let (scored, reconciliation) = self.score(batch)?;
        let summary = ScanSummary::new(&scored, batch.dropped_rows(), reconciliation, start.elapsed());

        info!(
            batch_id = %summary.batch_id,
            records = summary.total,
            flagged = summary.flagged,
            dropped_empty_rows = summary.dropped_empty_rows,
            scaling_applied = summary.reconciliation.scaling_applied,
            elapsed_us = summary.elapsed_us,
            "Batch scored"
        );

        Ok(ScanOutcome { scored, summary })
    }
}
