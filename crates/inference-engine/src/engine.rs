//! Inference Engine Implementation

use crate::loader::{FileModelLoader, LoadedModel, ModelLoader};
use crate::metadata::ModelMetadata;
use crate::model::Prediction;
use crate::InferenceError;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, info};

/// Confidence reported when the model has no probability estimate
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Label and confidence produced by the learned path
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Label exactly as the model produced it
    pub label: String,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f64,
}

/// Learned classification of a single log line
pub trait Classify: Send + Sync {
    fn classify(&self, log: &str) -> Result<Classification, InferenceError>;
}

/// Lazily loaded text classifier.
///
/// The model is loaded on the first `classify` call and reused afterwards.
/// Loading happens under the write lock so concurrent first calls load once;
/// a failed load leaves the slot empty and the next call tries again.
pub struct InferenceEngine {
    loader: Box<dyn ModelLoader>,
    model: RwLock<Option<Arc<LoadedModel>>>,
}

impl InferenceEngine {
    /// Create a new inference engine backed by `loader`
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            model: RwLock::new(None),
        }
    }

    /// Create an engine that loads from the filesystem
    pub fn from_paths(model_path: impl Into<PathBuf>, meta_path: impl Into<PathBuf>) -> Self {
        let loader = FileModelLoader::new(model_path, meta_path);
        info!(
            "Creating inference engine with model: {}",
            loader.model_path().display()
        );
        Self::new(loader)
    }

    /// Return the cached model, loading it if no load has succeeded yet
    fn loaded(&self) -> Result<Arc<LoadedModel>, InferenceError> {
        if let Some(model) = self.model.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return Ok(Arc::clone(model));
        }

        let mut slot = self.model.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        let model = Arc::new(self.loader.load()?);
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Check if a model has been loaded
    pub fn is_loaded(&self) -> bool {
        self.model.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Metadata of the loaded model, if any
    pub fn metadata(&self) -> Option<ModelMetadata> {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|m| m.metadata.clone())
    }

    /// `model_version` from the loaded model's metadata
    pub fn model_version(&self) -> Option<String> {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|m| m.metadata.model_version.clone())
    }
}

impl Classify for InferenceEngine {
    fn classify(&self, log: &str) -> Result<Classification, InferenceError> {
        let start = Instant::now();
        let model = self.loaded()?;

        let Prediction { label, probabilities } = model.classifier.predict_one(log)?;
        let confidence = match probabilities {
            Some(row) => max_probability(&row)?,
            None => DEFAULT_CONFIDENCE,
        };

        debug!(
            "Classified as {} (conf={:.2}, latency={}us)",
            label,
            confidence,
            start.elapsed().as_micros()
        );

        Ok(Classification { label, confidence })
    }
}

/// Highest class probability; rejects values that are not probabilities
fn max_probability(row: &[f64]) -> Result<f64, InferenceError> {
    if let Some(bad) = row.iter().find(|p| !p.is_finite() || !(0.0..=1.0).contains(*p)) {
        return Err(InferenceError::InferenceFailed(format!(
            "invalid class probability {}",
            bad
        )));
    }
    row.iter()
        .copied()
        .reduce(f64::max)
        .ok_or_else(|| InferenceError::InferenceFailed("empty probability row".to_string()))
}
