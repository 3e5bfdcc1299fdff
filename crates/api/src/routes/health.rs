//! Health and Metrics Routes

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Liveness response
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// Detailed health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub classifier: ClassifierHealth,
    pub rules: ComponentHealth,
}

/// Learned classifier state
#[derive(Debug, Serialize)]
pub struct ClassifierHealth {
    /// `loaded` once a model has been loaded, `not_loaded` before that
    pub status: &'static str,
    pub model_version: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: &'static str,
}

/// Liveness check
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "ok" })
}

/// Health check handler
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let classifier = state.engine.classifier();
    let classifier = ClassifierHealth {
        status: if classifier.is_loaded() { "loaded" } else { "not_loaded" },
        model_version: classifier.model_version(),
    };

    // The rule path has no dependencies, so a decision is always available
    Json(HealthResponse {
        status: "healthy",
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            classifier,
            rules: ComponentHealth { status: "ok" },
        },
    })
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
