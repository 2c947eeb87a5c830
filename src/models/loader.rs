//! All-or-nothing loading of the model artifacts

use crate::config::ModelsConfig;
use crate::error::{ScoringError, ScoringResult};
use crate::models::classifier::{Classifier, LogisticModel};
use crate::models::onnx::OnnxClassifier;
use crate::models::scaler::Scaler;
use crate::models::schema::FeatureSchema;
use std::path::Path;
use tracing::info;

/// Schema, scaler and classifier, loaded once and read-only afterwards
pub struct ModelBundle {
    schema: FeatureSchema,
    scaler: Scaler,
    classifier: Box<dyn Classifier>,
}

impl ModelBundle {
    /// Assemble a bundle from loaded parts, checking they fit together
    pub fn from_parts(
        schema: FeatureSchema,
        scaler: Scaler,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, String> {
        if let Some(n) = classifier.n_features() {
            if n != schema.len() {
                return Err(format!(
                    "classifier expects {} features but the schema lists {}",
                    n,
                    schema.len()
                ));
            }
        }

        Ok(Self {
            schema,
            scaler,
            classifier,
        })
    }

    /// Load every artifact named by `config`.
    ///
    /// Existence is checked for all three files before any is parsed, so a
    /// `MissingArtifact` error lists every absent file at once.
    pub fn load(config: &ModelsConfig) -> ScoringResult<Self> {
        let classifier_path = config.classifier_path();
        let scaler_path = config.scaler_path();
        let features_path = config.features_path();

        let missing: Vec<String> = [&classifier_path, &scaler_path, &features_path]
            .into_iter()
            .filter(|path| !path.is_file())
            .map(|path| file_name(path))
            .collect();
        if !missing.is_empty() {
            return Err(ScoringError::MissingArtifact { missing });
        }

        let schema = FeatureSchema::load(&features_path)?;
        info!(
            path = %features_path.display(),
            features = schema.len(),
            "Feature schema loaded"
        );

        let scaler = Scaler::load(&scaler_path)?;
        info!(
            path = %scaler_path.display(),
            columns = ?scaler.columns(),
            "Scaler loaded"
        );

        let classifier = load_classifier(&classifier_path, config.onnx_threads)?;
        info!(
            path = %classifier_path.display(),
            backend = classifier.name(),
            "Classifier loaded"
        );

        Self::from_parts(schema, scaler, classifier)
            .map_err(|e| ScoringError::invalid_artifact(&classifier_path, e))
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }
}

/// Pick the backend from the file extension
fn load_classifier(path: &Path, onnx_threads: usize) -> ScoringResult<Box<dyn Classifier>> {
    let is_onnx = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("onnx"));

    if is_onnx {
        Ok(Box::new(OnnxClassifier::load(path, onnx_threads)?))
    } else {
        Ok(Box::new(LogisticModel::load(path)?))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_artifacts(dir: &Path, coefficients: &str) {
        fs::write(dir.join("features.json"), r#"["Time","Amount","V1"]"#).unwrap();
        fs::write(
            dir.join("scaler.json"),
            r#"{"kind":"standard","mean":[0.0,0.0],"scale":[1.0,1.0]}"#,
        )
        .unwrap();
        fs::write(
            dir.join("fraud_model.json"),
            format!(r#"{{"kind":"logistic","coefficients":{},"intercept":0.0}}"#, coefficients),
        )
        .unwrap();
    }

    fn config_for(dir: &Path) -> ModelsConfig {
        ModelsConfig {
            models_dir: dir.to_string_lossy().into_owned(),
            ..ModelsConfig::default()
        }
    }

    #[test]
    fn test_loads_complete_bundle() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), "[0.1,0.2,0.3]");

        let bundle = ModelBundle::load(&config_for(dir.path())).unwrap();
        assert_eq!(bundle.schema().len(), 3);
        assert_eq!(bundle.classifier().name(), "logistic");
        assert_eq!(bundle.scaler().columns(), ["Time", "Amount"]);
    }

    #[test]
    fn test_reports_every_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("features.json"), r#"["V1"]"#).unwrap();

        match ModelBundle::load(&config_for(dir.path())) {
            Err(ScoringError::MissingArtifact { missing }) => {
                assert_eq!(missing, vec!["fraud_model.json", "scaler.json"]);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("load should fail"),
        }
    }

    #[test]
    fn test_rejects_coefficient_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), "[0.1,0.2]");

        let result = ModelBundle::load(&config_for(dir.path()));
        assert!(matches!(result, Err(ScoringError::InvalidArtifact { .. })));
    }

    #[test]
    fn test_rejects_malformed_scaler() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), "[0.1,0.2,0.3]");
        fs::write(dir.path().join("scaler.json"), "not json").unwrap();

        let result = ModelBundle::load(&config_for(dir.path()));
        assert!(matches!(result, Err(ScoringError::InvalidArtifact { .. })));
    }
}
