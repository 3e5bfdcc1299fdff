//! Model Loading

use crate::metadata::ModelMetadata;
use crate::model::{LinearTextModel, TextClassifier};
use crate::onnx::OnnxTextModel;
use crate::InferenceError;
use std::path::{Path, PathBuf};
use tracing::info;

/// A classifier together with its metadata
pub struct LoadedModel {
    pub classifier: Box<dyn TextClassifier>,
    pub metadata: ModelMetadata,
}

/// Source of a trained model
pub trait ModelLoader: Send + Sync {
    /// Load the model; called again after every failure
    fn load(&self) -> Result<LoadedModel, InferenceError>;
}

/// Loads a model artifact and its metadata sidecar from the filesystem.
///
/// The artifact format follows the file extension: `.json` for
/// [`LinearTextModel`], `.onnx` for [`OnnxTextModel`].
#[derive(Debug, Clone)]
pub struct FileModelLoader {
    model_path: PathBuf,
    meta_path: PathBuf,
}

impl FileModelLoader {
    /// Create a loader for the given artifact and metadata paths
    pub fn new(model_path: impl Into<PathBuf>, meta_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            meta_path: meta_path.into(),
        }
    }

    /// Get model path
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Get metadata path
    pub fn meta_path(&self) -> &Path {
        &self.meta_path
    }
}

impl ModelLoader for FileModelLoader {
    fn load(&self) -> Result<LoadedModel, InferenceError> {
        if !self.model_path.exists() {
            return Err(InferenceError::ClassifierUnavailable(format!(
                "Model not found at {}",
                self.model_path.display()
            )));
        }

        let metadata = ModelMetadata::from_path(&self.meta_path)?;

        let extension = self
            .model_path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let classifier: Box<dyn TextClassifier> = match extension.as_deref() {
            Some("json") => Box::new(LinearTextModel::from_path(&self.model_path)?),
            Some("onnx") => Box::new(OnnxTextModel::load(&self.model_path, &metadata)?),
            _ => {
                return Err(InferenceError::ClassifierUnavailable(format!(
                    "Unsupported model format: {}",
                    self.model_path.display()
                )))
            }
        };

        info!(
            "Model loaded from {} (version: {})",
            self.model_path.display(),
            metadata.model_version.as_deref().unwrap_or("unversioned")
        );

        Ok(LoadedModel { classifier, metadata })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample_model_json;

    #[test]
    fn test_missing_model_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FileModelLoader::new(
            dir.path().join("incident_clf.json"),
            dir.path().join("model_meta.json"),
        );

        let err = loader.load().err().unwrap();
        assert!(matches!(err, InferenceError::ClassifierUnavailable(_)));
        assert!(err.to_string().contains("Model not found"));
    }

    #[test]
    fn test_loads_json_model_without_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("incident_clf.json");
        std::fs::write(&model_path, sample_model_json(true)).unwrap();

        let loaded = FileModelLoader::new(&model_path, dir.path().join("model_meta.json"))
            .load()
            .unwrap();
        assert_eq!(loaded.metadata, ModelMetadata::default());
        assert_eq!(loaded.classifier.predict(&["deadline"]).unwrap(), vec!["timeout"]);
    }

    #[test]
    fn test_loads_metadata_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("incident_clf.json");
        let meta_path = dir.path().join("model_meta.json");
        std::fs::write(&model_path, sample_model_json(true)).unwrap();
        std::fs::write(&meta_path, r#"{"model_version": "v3"}"#).unwrap();

        let loaded = FileModelLoader::new(&model_path, &meta_path).load().unwrap();
        assert_eq!(loaded.metadata.model_version.as_deref(), Some("v3"));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("incident_clf.joblib");
        std::fs::write(&model_path, b"\x80\x04pickle").unwrap();

        let err = FileModelLoader::new(&model_path, dir.path().join("meta.json"))
            .load()
            .err()
            .unwrap();
        assert!(err.to_string().contains("Unsupported model format"));
    }

    #[test]
    fn test_corrupt_json_model() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("incident_clf.json");
        std::fs::write(&model_path, "{\"labels\": [").unwrap();

        let err = FileModelLoader::new(&model_path, dir.path().join("meta.json"))
            .load()
            .err()
            .unwrap();
        assert!(matches!(err, InferenceError::ClassifierUnavailable(_)));
    }
}
