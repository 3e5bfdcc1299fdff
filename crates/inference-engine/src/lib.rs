//! Learned Incident Classifier
//!
//! Loads a trained text classifier on first use and turns its output into a
//! `(label, confidence)` pair. Supported artifacts are linear bag-of-words
//! models serialized as JSON and ONNX graphs run with tract.

mod engine;
mod loader;
mod metadata;
mod model;
mod onnx;

pub use engine::{Classification, Classify, InferenceEngine, DEFAULT_CONFIDENCE};
pub use loader::{FileModelLoader, LoadedModel, ModelLoader};
pub use metadata::ModelMetadata;
pub use model::{tokenize, LinearTextModel, Prediction, TextClassifier};
pub use onnx::OnnxTextModel;

use thiserror::Error;

/// Errors from the learned classification path
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Model artifact or its metadata is missing, unreadable or corrupt
    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),
    /// The loaded model failed while predicting
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}
