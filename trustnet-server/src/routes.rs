//! Request handlers.

use crate::AppState;
use crate::error::ApiError;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

pub const CLASSIFIER_HEADER: HeaderName = HeaderName::from_static("x-trustnet-classifier");
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Body of `POST /evaluate` and `POST /signals`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub question: String,
    pub context: String,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// `trained`, `fallback`, or `none` when no classifier is in use.
    pub classifier: String,
    pub mode: String,
    pub version: String,
}

pub async fn evaluate(
    State(state): State<AppState>,
    body: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("evaluate", %request_id);

    let result = state
        .pipeline
        .evaluate(&req.question, &req.context, &req.answer)
        .instrument(span)
        .await?;
    Ok(with_headers(&state, request_id, Json(result)))
}

pub async fn signals(
    State(state): State<AppState>,
    body: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("signals", %request_id);

    let scores = state
        .pipeline
        .evaluate_signals(&req.question, &req.context, &req.answer)
        .instrument(span)
        .await?;
    Ok(with_headers(&state, request_id, Json(scores)))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        classifier: state.classifier_name().into(),
        mode: state.pipeline.mode().to_string(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

fn with_headers(state: &AppState, request_id: Uuid, body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(
        CLASSIFIER_HEADER,
        HeaderValue::from_static(state.classifier_name()),
    );
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    response
}
