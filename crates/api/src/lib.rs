//! Incident Decision API Server
//!
//! HTTP boundary around the decision engine: request validation, CORS,
//! optional rate limiting, health and Prometheus metrics.

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use decision_engine::DecisionEngine;
use inference_engine::InferenceEngine;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::GovernorLayer;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod error;
mod rate_limit;
mod routes;
mod settings;

pub use error::ApiError;
pub use rate_limit::{create_governor_config, RateLimitConfig};
pub use routes::predict::{PredictRequest, MIN_LOG_CHARS};
pub use settings::{CorsSettings, LoggingSettings, ModelSettings, Settings};

/// Application state shared across handlers
pub struct AppState {
    /// Decision engine with its lazily loaded classifier
    pub engine: Arc<DecisionEngine<InferenceEngine>>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus handle, when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        engine: DecisionEngine<InferenceEngine>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics,
        }
    }

    /// Build state from model settings
    pub fn from_settings(model: &ModelSettings, metrics: Option<PrometheusHandle>) -> Self {
        let classifier = InferenceEngine::from_paths(&model.model_path, &model.meta_path);
        Self::new(DecisionEngine::new(classifier), metrics)
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>, cors: &CorsSettings) -> Router {
    Router::new()
        .route("/health", get(routes::health::liveness))
        .route("/api/v1/health", get(routes::health::health))
        .route("/api/v1/predict", post(routes::predict::predict))
        .route("/metrics", get(routes::health::metrics))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors)),
        )
}

/// Router plus per-IP rate limiting when enabled in `settings`.
///
/// The limiter keys on `ConnectInfo<SocketAddr>`, so the app must be served
/// with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_app(state: Arc<AppState>, settings: &Settings) -> anyhow::Result<Router> {
    let app = create_router(state, &settings.cors);
    if !settings.rate_limit.enabled {
        return Ok(app);
    }

    let config = create_governor_config(&settings.rate_limit).context("invalid rate limit quota")?;
    info!(
        "Rate limiting enabled: burst {} per {}s",
        settings.rate_limit.burst_size, settings.rate_limit.per_second
    );
    Ok(app.layer(GovernorLayer { config }))
}

/// CORS policy; an empty origin list allows any origin
fn cors_layer(settings: &CorsSettings) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if settings.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Initialize logging. `RUST_LOG` overrides the configured level.
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}

/// Run the server until ctrl-c
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let metrics = if settings.metrics.enabled {
        Some(
            PrometheusBuilder::new()
                .install_recorder()
                .context("failed to install metrics recorder")?,
        )
    } else {
        None
    };

    if !settings.model.model_path.exists() {
        warn!(
            "No model at {}; decisions use keyword rules until one is deployed",
            settings.model.model_path.display()
        );
    }

    let state = Arc::new(AppState::from_settings(&settings.model, metrics));
    let app = create_app(state, &settings)?;

    let addr = settings.server.addr();
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
