//! Model Metadata Sidecar

use crate::InferenceError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Optional metadata written next to a model artifact.
///
/// Unknown keys are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Class labels in model output order
    pub labels: Option<Vec<String>>,
    /// Term to feature column, for models that take term counts
    pub vocabulary: Option<HashMap<String, usize>>,
    /// Whether model outputs are class probabilities
    pub outputs_probabilities: Option<bool>,
    /// Free-form version string
    pub model_version: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ModelMetadata {
    /// Read metadata from disk. A missing file yields empty metadata.
    pub fn from_path(path: &Path) -> Result<Self, InferenceError> {
        if !path.exists() {
            debug!("No model metadata at {}", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            InferenceError::ClassifierUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            InferenceError::ClassifierUnavailable(format!(
                "corrupt metadata {}: {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let meta = ModelMetadata::from_path(&dir.path().join("model_meta.json")).unwrap();
        assert_eq!(meta, ModelMetadata::default());
    }

    #[test]
    fn test_known_and_extra_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_meta.json");
        std::fs::write(
            &path,
            r#"{"model_version": "2024-06-01", "labels": ["auth"], "trained_rows": 5000}"#,
        )
        .unwrap();

        let meta = ModelMetadata::from_path(&path).unwrap();
        assert_eq!(meta.model_version.as_deref(), Some("2024-06-01"));
        assert_eq!(meta.labels, Some(vec!["auth".to_string()]));
        assert_eq!(meta.extra.get("trained_rows"), Some(&serde_json::json!(5000)));
    }

    #[test]
    fn test_corrupt_metadata_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_meta.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = ModelMetadata::from_path(&path).unwrap_err();
        assert!(matches!(err, InferenceError::ClassifierUnavailable(_)));
    }
}
