//! Fitted column scaler

use crate::error::{ScoringError, ScoringResult};
use serde::Deserialize;
use std::path::Path;

fn default_columns() -> Vec<String> {
    vec!["Time".to_string(), "Amount".to_string()]
}

/// Per-column affine parameters, one entry per scaled column
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScalerParams {
    /// `(x - mean) / scale`; either vector may be omitted
    Standard {
        #[serde(default)]
        mean: Option<Vec<f64>>,
        #[serde(default)]
        scale: Option<Vec<f64>>,
    },
    /// `(x - center) / scale`
    Robust {
        #[serde(default)]
        center: Option<Vec<f64>>,
        #[serde(default)]
        scale: Option<Vec<f64>>,
    },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

#[derive(Debug, Clone, Deserialize)]
struct ScalerFile {
    #[serde(default = "default_columns")]
    columns: Vec<String>,
    #[serde(flatten)]
    params: ScalerParams,
}

/// A scaler fitted on a fixed set of columns
#[derive(Debug, Clone, PartialEq)]
pub struct Scaler {
    columns: Vec<String>,
    params: ScalerParams,
}

impl Scaler {
    /// Build from the artifact's columns and parameters, validating shapes
    pub fn new(columns: Vec<String>, params: ScalerParams) -> Result<Self, String> {
        if columns.is_empty() {
            return Err("scaler has no columns".to_string());
        }
        let n = columns.len();

        let check = |name: &str, values: Option<&Vec<f64>>| -> Result<(), String> {
            match values {
                Some(v) if v.len() != n => Err(format!(
                    "{} has {} entries, expected {} (one per column)",
                    name,
                    v.len(),
                    n
                )),
                Some(v) if v.iter().any(|x| !x.is_finite()) => {
                    Err(format!("{} contains a non-finite value", name))
                }
                _ => Ok(()),
            }
        };

        match &params {
            ScalerParams::Standard {
                mean: center,
                scale,
            }
            | ScalerParams::Robust { center, scale } => {
                check("center", center.as_ref())?;
                check("scale", scale.as_ref())?;
                if scale.iter().flatten().any(|&s| s == 0.0) {
                    return Err("scale contains zero".to_string());
                }
            }
            ScalerParams::MinMax { min, scale } => {
                check("min", Some(min))?;
                check("scale", Some(scale))?;
            }
        }

        Ok(Self { columns, params })
    }

    /// Load a scaler artifact from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> ScoringResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let file: ScalerFile = serde_json::from_str(&text)
            .map_err(|e| ScoringError::invalid_artifact(path, e))?;

        Self::new(file.columns, file.params).map_err(|e| ScoringError::invalid_artifact(path, e))
    }

    /// Columns the scaler was fitted on, in fit order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Scale one value of the column at `position` in `columns()`
    pub fn transform_value(&self, position: usize, value: f64) -> f64 {
        match &self.params {
            ScalerParams::Standard {
                mean: center,
                scale,
            }
            | ScalerParams::Robust { center, scale } => {
                let c = center.as_ref().map_or(0.0, |c| c[position]);
                let s = scale.as_ref().map_or(1.0, |s| s[position]);
                (value - c) / s
            }
            ScalerParams::MinMax { min, scale } => value * scale[position] + min[position],
        }
    }

    /// Scale a whole column in place
    pub fn transform_column(&self, position: usize, values: &mut [f64]) {
        for v in values.iter_mut() {
            *v = self.transform_value(position, *v);
        }
    }
}
