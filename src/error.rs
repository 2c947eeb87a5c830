//! Error taxonomy for artifact loading and batch scoring

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the scoring library.
///
/// `MissingArtifact` and `InvalidArtifact` are startup failures: the caller
/// must refuse to score anything. The rest are per-batch and leave the loaded
/// artifacts usable for the next batch.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("model artifacts not found: {}", .missing.join(", "))]
    MissingArtifact { missing: Vec<String> },

    #[error("invalid artifact {}: {reason}", .path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type ScoringResult<T> = Result<T, ScoringError>;

impl ScoringError {
    pub fn invalid_artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::InvalidArtifact {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(reason: impl ToString) -> Self {
        Self::MalformedInput(reason.to_string())
    }

    /// True for errors that must stop the process before any batch is served.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingArtifact { .. } | Self::InvalidArtifact { .. }
        )
    }
}

impl From<csv::Error> for ScoringError {
    fn from(err: csv::Error) -> Self {
        if !err.is_io_error() {
            return Self::MalformedInput(err.to_string());
        }
        match err.into_kind() {
            csv::ErrorKind::Io(io_err) => Self::Io(io_err),
            other => Self::MalformedInput(format!("{:?}", other)),
        }
    }
}
