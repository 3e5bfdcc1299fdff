//! ONNX Text Classifier
//!
//! Runs an ONNX graph with tract. The graph takes a `[1, width]` f32 term
//! count vector and returns one row of class scores. Labels and vocabulary
//! come from the metadata sidecar because the graph itself carries neither.

use crate::metadata::ModelMetadata;
use crate::model::{argmax, term_counts, validate_vocabulary, Prediction, TextClassifier};
use crate::InferenceError;
use std::collections::HashMap;
use std::path::Path;
use tract_onnx::prelude::*;
use tracing::info;

type RunnablePlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-backed text classifier
pub struct OnnxTextModel {
    plan: RunnablePlan,
    labels: Vec<String>,
    vocabulary: HashMap<String, usize>,
    width: usize,
    outputs_probabilities: bool,
}

impl OnnxTextModel {
    /// Load and optimize the ONNX graph at `path`
    pub fn load(path: &Path, metadata: &ModelMetadata) -> Result<Self, InferenceError> {
        let labels = metadata
            .labels
            .clone()
            .filter(|l| !l.is_empty())
            .ok_or_else(|| {
                InferenceError::ClassifierUnavailable(
                    "ONNX model requires labels in metadata".to_string(),
                )
            })?;
        let vocabulary = metadata
            .vocabulary
            .clone()
            .ok_or_else(|| {
                InferenceError::ClassifierUnavailable(
                    "ONNX model requires a vocabulary in metadata".to_string(),
                )
            })?;

        let width = vocabulary.values().max().map(|m| m + 1).unwrap_or(0);
        if width == 0 {
            return Err(InferenceError::ClassifierUnavailable("empty vocabulary".to_string()));
        }
        validate_vocabulary(&vocabulary, width)?;

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, width]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| {
                InferenceError::ClassifierUnavailable(format!(
                    "cannot load ONNX model {}: {}",
                    path.display(),
                    e
                ))
            })?;

        info!("ONNX model loaded: {} classes, {} features", labels.len(), width);

        Ok(Self {
            plan,
            labels,
            vocabulary,
            width,
            outputs_probabilities: metadata.outputs_probabilities.unwrap_or(true),
        })
    }

    /// Run the graph on one text and return its class scores
    fn scores(&self, text: &str) -> Result<Vec<f64>, InferenceError> {
        let failed = |e: TractError| InferenceError::InferenceFailed(e.to_string());

        let features: Vec<f32> = term_counts(text, &self.vocabulary, self.width)
            .into_iter()
            .map(|c| c as f32)
            .collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.width), features)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?
            .into();

        let outputs = self.plan.run(tvec!(input.into())).map_err(failed)?;
        let output = outputs.first().ok_or_else(|| {
            InferenceError::InferenceFailed("model produced no outputs".to_string())
        })?;
        let scores: Vec<f64> = output
            .to_array_view::<f32>()
            .map_err(failed)?
            .iter()
            .map(|&v| v as f64)
            .collect();

        if scores.len() != self.labels.len() {
            return Err(InferenceError::InferenceFailed(format!(
                "expected {} class scores, got {}",
                self.labels.len(),
                scores.len()
            )));
        }
        Ok(scores)
    }

    fn label_for(&self, scores: &[f64]) -> Result<String, InferenceError> {
        argmax(scores)
            .and_then(|i| self.labels.get(i).cloned())
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no scores".to_string()))
    }
}

impl TextClassifier for OnnxTextModel {
    fn predict(&self, texts: &[&str]) -> Result<Vec<String>, InferenceError> {
        texts
            .iter()
            .map(|text| self.label_for(&self.scores(text)?))
            .collect()
    }

    fn predict_proba(&self, texts: &[&str]) -> Result<Option<Vec<Vec<f64>>>, InferenceError> {
        if !self.outputs_probabilities {
            return Ok(None);
        }
        texts
            .iter()
            .map(|text| self.scores(text))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn predict_one(&self, text: &str) -> Result<Prediction, InferenceError> {
        let scores = self.scores(text)?;
        let label = self.label_for(&scores)?;
        let probabilities = self.outputs_probabilities.then_some(scores);
        Ok(Prediction { label, probabilities })
    }
}
