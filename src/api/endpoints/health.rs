//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::pipeline::ModelOrigin;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model_classes: Vec<String>,
    pub vocabulary_size: usize,
    pub dataset: String,
    pub model_origin: ModelOrigin,
}

/// `GET /api/health`: liveness plus a summary of the loaded model.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let summary = ctx.core.engine_summary();

    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        model_classes: summary.diseases,
        vocabulary_size: summary.vocabulary_size,
        dataset: summary.dataset,
        model_origin: summary.origin,
    })
}
