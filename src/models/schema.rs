//! Ordered feature list the classifier was trained on

use crate::error::{ScoringError, ScoringResult};
use std::collections::HashSet;
use std::path::Path;

/// Feature names in the exact order the classifier expects them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Result<Self, String> {
        if names.is_empty() {
            return Err("feature list is empty".to_string());
        }

        let mut seen = HashSet::with_capacity(names.len());
        if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(format!("duplicate feature name {:?}", dup));
        }

        Ok(Self { names })
    }

    /// Load a JSON array of feature names
    pub fn load<P: AsRef<Path>>(path: P) -> ScoringResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let names: Vec<String> = serde_json::from_str(&text)
            .map_err(|e| ScoringError::invalid_artifact(path, e))?;

        Self::new(names).map_err(|e| ScoringError::invalid_artifact(path, e))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_duplicates() {
        let err = FeatureSchema::new(vec!["V1".into(), "V2".into(), "V1".into()]).unwrap_err();
        assert!(err.contains("V1"));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(FeatureSchema::new(Vec::new()).is_err());
    }

    #[test]
    fn test_load_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.json");
        std::fs::write(&path, r#"["Time","V1","Amount"]"#).unwrap();

        let schema = FeatureSchema::load(&path).unwrap();
        assert_eq!(schema.names(), ["Time", "V1", "Amount"]);
        assert!(schema.contains("V1"));
    }

    #[test]
    fn test_load_rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.json");
        std::fs::write(&path, r#"{"features": []}"#).unwrap();

        let err = FeatureSchema::load(&path).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidArtifact { .. }));
    }
}
