//! Fraud Batch Scorer Library
//!
//! Scores uploaded CSV batches of card transactions with a pre-trained
//! binary classifier: reconciles the batch with the training feature schema,
//! normalizes the scaled columns, predicts a label and probability per
//! record, and exports the full annotated batch.

pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod ingest;
pub mod models;
pub mod render;
pub mod runner;
pub mod scorer;
pub mod summary;
pub mod types;

pub use config::AppConfig;
pub use error::{ScoringError, ScoringResult};
pub use features::{FeatureMatrix, Reconciliation};
pub use models::ModelBundle;
pub use scorer::{BatchScorer, ScanOutcome};
pub use summary::ScanSummary;
pub use types::{Record, ScoredBatch, ScoredRecord, TransactionBatch, Verdict};
