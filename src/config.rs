//! Configuration management for the batch scorer

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// What to do when the batch lacks a feature the schema expects
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingFeaturePolicy {
    /// Synthesize the feature as a column of zeros and log a warning
    #[default]
    ZeroFill,
    /// Reject the whole batch
    Reject,
}

/// What to do with uploaded columns that are neither features nor the label
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtraColumnPolicy {
    /// Keep them in the passthrough output, leave them out of the matrix
    #[default]
    Ignore,
    /// Reject the whole batch
    Reject,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub models: ModelsConfig,
    pub scoring: ScoringConfig,
    pub logging: LoggingConfig,
}

/// Model artifact locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory containing the artifacts
    pub models_dir: String,
    /// Classifier file; `.onnx` selects ONNX Runtime, anything else is read as JSON
    pub classifier_file: String,
    /// Scaler parameters (JSON)
    pub scaler_file: String,
    /// Ordered feature names (JSON array)
    pub features_file: String,
    /// Number of intra-op threads for ONNX inference
    pub onnx_threads: usize,
}

impl ModelsConfig {
    pub fn classifier_path(&self) -> PathBuf {
        Path::new(&self.models_dir).join(&self.classifier_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        Path::new(&self.models_dir).join(&self.scaler_file)
    }

    pub fn features_path(&self) -> PathBuf {
        Path::new(&self.models_dir).join(&self.features_file)
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            models_dir: "models".to_string(),
            classifier_file: "fraud_model.json".to_string(),
            scaler_file: "scaler.json".to_string(),
            features_file: "features.json".to_string(),
            onnx_threads: 1,
        }
    }
}

/// Scoring behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Ground-truth column excluded from the feature matrix
    pub label_column: String,
    /// Positive-class probability above which a record is labelled fraud
    pub decision_threshold: f64,
    pub missing_features: MissingFeaturePolicy,
    pub extra_columns: ExtraColumnPolicy,
    /// Rows shown by `preview`
    pub preview_rows: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            label_column: "Class".to_string(),
            decision_threshold: 0.5,
            missing_features: MissingFeaturePolicy::ZeroFill,
            extra_columns: ExtraColumnPolicy::Ignore,
            preview_rows: 5,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific path.
    ///
    /// The file is optional; `FRAUD_SCAN__<SECTION>__<KEY>` environment
    /// variables override it and serde defaults fill the rest.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("FRAUD_SCAN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app.validate()?;
        Ok(app)
    }

    fn validate(&self) -> Result<()> {
        let threshold = self.scoring.decision_threshold;
        if !(0.0..1.0).contains(&threshold) {
            anyhow::bail!(
                "scoring.decision_threshold must be in [0, 1), got {}",
                threshold
            );
        }
        if self.scoring.label_column.is_empty() {
            anyhow::bail!("scoring.label_column must not be empty");
        }
        Ok(())
    }
}
