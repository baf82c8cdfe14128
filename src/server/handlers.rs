//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Html,
    Json,
};

use crate::record::{PredictionRequest, PredictionResponse};

use super::error::{Result, ServerError};
use super::state::AppState;

/// Predict the salary for one posting.
///
/// Bodies that fail to parse are rejected with 400 before any pipeline stage
/// runs. Inference is CPU-bound and runs on the blocking pool.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>> {
    let Json(request) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let service = Arc::clone(&state.service);
    let salary = tokio::task::spawn_blocking(move || service.predict(request))
        .await
        .map_err(|e| ServerError::Internal(format!("prediction task panicked: {}", e)))??;

    tracing::debug!(salary, "Served prediction");
    Ok(Json(PredictionResponse { salary }))
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn serve_index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.index_html.clone())
}
