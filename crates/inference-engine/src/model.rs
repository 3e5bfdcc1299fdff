//! Text Classifier Models

use crate::InferenceError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A trained classifier over raw log text.
///
/// `predict_proba` returns `Ok(None)` when the model has no probability
/// estimate, e.g. margin classifiers.
pub trait TextClassifier: Send + Sync {
    /// Predict one label per input text
    fn predict(&self, texts: &[&str]) -> Result<Vec<String>, InferenceError>;

    /// Per-class probabilities for each input text, if supported
    fn predict_proba(&self, _texts: &[&str]) -> Result<Option<Vec<Vec<f64>>>, InferenceError> {
        Ok(None)
    }

    /// Label and probability row for a single text.
    ///
    /// The default runs `predict` then `predict_proba`; models that score
    /// once for both should override it.
    fn predict_one(&self, text: &str) -> Result<Prediction, InferenceError> {
        let batch = [text];
        let label = self
            .predict(&batch)?
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::InferenceFailed("model returned no label".to_string()))?;
        let probabilities = match self.predict_proba(&batch)? {
            Some(rows) => Some(rows.into_iter().next().ok_or_else(|| {
                InferenceError::InferenceFailed("model returned no probabilities".to_string())
            })?),
            None => None,
        };
        Ok(Prediction { label, probabilities })
    }
}

/// Output of [`TextClassifier::predict_one`]
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    /// Class probabilities, `None` for margin models
    pub probabilities: Option<Vec<f64>>,
}

/// Split text into lower-cased word tokens
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

/// Bag-of-words term counts over a fixed vocabulary
pub(crate) fn term_counts(
    text: &str,
    vocabulary: &HashMap<String, usize>,
    width: usize,
) -> Vec<f64> {
    let mut counts = vec![0.0; width];
    for token in tokenize(text) {
        if let Some(&index) = vocabulary.get(&token) {
            if let Some(slot) = counts.get_mut(index) {
                *slot += 1.0;
            }
        }
    }
    counts
}

/// Index of the largest score
pub(crate) fn argmax(scores: &[f64]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
}

/// Numerically stable softmax
pub(crate) fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Check that a vocabulary maps every term inside `0..width`
pub(crate) fn validate_vocabulary(
    vocabulary: &HashMap<String, usize>,
    width: usize,
) -> Result<(), InferenceError> {
    match vocabulary.iter().find(|(_, &index)| index >= width) {
        Some((term, index)) => Err(InferenceError::ClassifierUnavailable(format!(
            "vocabulary term '{}' has index {} outside feature width {}",
            term, index, width
        ))),
        None => Ok(()),
    }
}

/// Linear bag-of-words classifier serialized as JSON.
///
/// Each class scores `intercept + Σ weight[term] * count(term)`. When
/// `probabilistic` is set the scores are treated as logits and softmaxed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearTextModel {
    /// Class labels, one per weight row
    pub labels: Vec<String>,
    /// Term to feature column
    pub vocabulary: HashMap<String, usize>,
    /// Weight matrix, `labels.len()` rows by feature width columns
    pub weights: Vec<Vec<f64>>,
    /// Per-class bias
    pub intercepts: Vec<f64>,
    /// Whether scores can be turned into class probabilities
    #[serde(default = "default_probabilistic")]
    pub probabilistic: bool,
}

fn default_probabilistic() -> bool {
    true
}

impl LinearTextModel {
    /// Read and validate a model from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, InferenceError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            InferenceError::ClassifierUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    /// Parse and validate a model from a JSON string
    pub fn from_json(raw: &str) -> Result<Self, InferenceError> {
        let model: Self = serde_json::from_str(raw)
            .map_err(|e| InferenceError::ClassifierUnavailable(format!("corrupt model: {}", e)))?;
        model.validate()?;
        Ok(model)
    }

    fn label_for(&self, scores: &[f64]) -> Result<String, InferenceError> {
        argmax(scores)
            .and_then(|i| self.labels.get(i).cloned())
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no scores".to_string()))
    }

    /// Check shape consistency between labels, weights and vocabulary
    pub fn validate(&self) -> Result<(), InferenceError> {
        let corrupt = |msg: String| Err(InferenceError::ClassifierUnavailable(msg));

        if self.labels.is_empty() {
            return corrupt("model has no labels".to_string());
        }
        if self.weights.len() != self.labels.len() {
            return corrupt(format!(
                "expected {} weight rows, got {}",
                self.labels.len(),
                self.weights.len()
            ));
        }
        if self.intercepts.len() != self.labels.len() {
            return corrupt(format!(
                "expected {} intercepts, got {}",
                self.labels.len(),
                self.intercepts.len()
            ));
        }

        let width = self.width();
        if let Some(row) = self.weights.iter().position(|r| r.len() != width) {
            return corrupt(format!("weight row {} does not have width {}", row, width));
        }
        validate_vocabulary(&self.vocabulary, width)
    }

    /// Feature width
    pub fn width(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    /// Raw class scores for one text
    fn scores(&self, text: &str) -> Vec<f64> {
        let counts = term_counts(text, &self.vocabulary, self.width());
        self.weights
            .iter()
            .zip(&self.intercepts)
            .map(|(row, bias)| bias + row.iter().zip(&counts).map(|(w, c)| w * c).sum::<f64>())
            .collect()
    }
}

impl TextClassifier for LinearTextModel {
    fn predict(&self, texts: &[&str]) -> Result<Vec<String>, InferenceError> {
        texts
            .iter()
            .map(|text| self.label_for(&self.scores(text)))
            .collect()
    }

    fn predict_proba(&self, texts: &[&str]) -> Result<Option<Vec<Vec<f64>>>, InferenceError> {
        if !self.probabilistic {
            return Ok(None);
        }
        Ok(Some(texts.iter().map(|text| softmax(&self.scores(text))).collect()))
    }

    fn predict_one(&self, text: &str) -> Result<Prediction, InferenceError> {
        let scores = self.scores(text);
        let label = self.label_for(&scores)?;
        let probabilities = self.probabilistic.then(|| softmax(&scores));
        Ok(Prediction { label, probabilities })
    }
}
