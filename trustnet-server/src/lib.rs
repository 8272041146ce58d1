//! # TrustNet Server
//!
//! HTTP boundary over the evaluation pipeline, built on axum.
//!
//! - `POST /evaluate` scores an answer: label, trust score, decision, signals.
//! - `POST /signals` returns the signal values only.
//! - `GET /health` reports the active classifier and evaluation mode.

pub mod error;
pub mod routes;

pub use error::{ApiError, ErrorBody};
pub use routes::{CLASSIFIER_HEADER, EvaluationRequest, HealthResponse, REQUEST_ID_HEADER};

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use trustnet_core::EvaluationPipeline;
use trustnet_core::config::ServerConfig;

/// Shared handler state. The pipeline is immutable after startup.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: Arc<EvaluationPipeline>,
}

impl AppState {
    pub fn new(pipeline: EvaluationPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Name of the active classifier, as reported by `/health` and the
    /// `x-trustnet-classifier` header.
    pub fn classifier_name(&self) -> &'static str {
        self.pipeline
            .classifier_kind()
            .map_or("none", |kind| kind.as_str())
    }
}

/// Build the router with CORS, request tracing and a body size limit.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/evaluate", post(routes::evaluate))
        .route("/signals", post(routes::signals))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Serve on the configured address until ctrl-c.
pub async fn run(config: &ServerConfig, pipeline: EvaluationPipeline) -> Result<(), std::io::Error> {
    let state = AppState::new(pipeline);
    tracing::info!(
        classifier = state.classifier_name(),
        mode = %state.pipeline.mode(),
        "Evaluation pipeline ready"
    );
    let app = router(state, config);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "TrustNet server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("TrustNet server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
