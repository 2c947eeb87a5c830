//! Binary classifier interface and the JSON logistic backend

use crate::error::{ScoringError, ScoringResult};
use crate::features::FeatureMatrix;
use serde::Deserialize;
use std::path::Path;

/// A fitted binary classifier.
///
/// Implementations are immutable after load and shared across batches.
pub trait Classifier: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Number of input features, when the artifact declares it
    fn n_features(&self) -> Option<usize>;

    /// Positive-class probability for every row of `matrix`
    fn predict_proba(&self, matrix: &FeatureMatrix) -> ScoringResult<Vec<f64>>;
}

/// 1 iff the positive-class probability exceeds `threshold`; at 0.5 this is
/// argmax over the two classes with ties going to class 0
pub fn label_for(probability: f64, threshold: f64) -> u8 {
    u8::from(probability > threshold)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ClassifierFile {
    Logistic {
        coefficients: Vec<f64>,
        #[serde(default)]
        intercept: f64,
    },
}

/// Logistic regression: `sigmoid(w · x + b)`
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticModel {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self, String> {
        if coefficients.is_empty() {
            return Err("logistic model has no coefficients".to_string());
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err("logistic model has non-finite parameters".to_string());
        }
        Ok(Self {
            coefficients,
            intercept,
        })
    }

    /// Load a JSON classifier artifact
    pub fn load<P: AsRef<Path>>(path: P) -> ScoringResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let file: ClassifierFile = serde_json::from_str(&text)
            .map_err(|e| ScoringError::invalid_artifact(path, e))?;

        match file {
            ClassifierFile::Logistic {
                coefficients,
                intercept,
            } => Self::new(coefficients, intercept)
                .map_err(|e| ScoringError::invalid_artifact(path, e)),
        }
    }

    fn decision_function(&self, row: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(row)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticModel {
    fn name(&self) -> &str {
        "logistic"
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict_proba(&self, matrix: &FeatureMatrix) -> ScoringResult<Vec<f64>> {
        if matrix.n_cols() != self.coefficients.len() {
            return Err(ScoringError::Inference(format!(
                "expected {} features, got {}",
                self.coefficients.len(),
                matrix.n_cols()
            )));
        }

        Ok(matrix
            .rows()
            .map(|row| sigmoid(self.decision_function(row)))
            .collect())
    }
}
