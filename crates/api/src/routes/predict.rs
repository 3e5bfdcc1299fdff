//! Prediction Routes

use axum::{extract::State, Json};
use decision_engine::Decision;
use metrics::counter;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Minimum log length in characters
pub const MIN_LOG_CHARS: usize = 5;

/// Request body for the predict endpoint
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Raw log line or error message
    pub log: String,
    /// Where the log came from, e.g. ci, backend, nginx
    pub source: Option<String>,
}

impl PredictRequest {
    /// Log length in Unicode scalar values
    pub fn char_len(&self) -> usize {
        self.log.chars().count()
    }

    /// Reject logs shorter than [`MIN_LOG_CHARS`]
    pub fn validate(&self) -> Result<(), ApiError> {
        let len = self.char_len();
        if len < MIN_LOG_CHARS {
            return Err(ApiError::Validation(format!(
                "log must be at least {} characters, got {}",
                MIN_LOG_CHARS, len
            )));
        }
        Ok(())
    }
}

/// Classify a log line
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<Decision>, ApiError> {
    if let Err(e) = request.validate() {
        counter!("incident_predict_rejected_total").increment(1);
        return Err(e);
    }

    debug!(
        "Predict request: {} chars from {}",
        request.char_len(),
        request.source.as_deref().unwrap_or("unspecified")
    );

    // Inference is CPU-bound
    let engine = Arc::clone(&state.engine);
    let decision = tokio::task::spawn_blocking(move || engine.decide(&request.log))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(decision))
}
