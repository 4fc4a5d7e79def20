//! Classification endpoints
//!
//! Both endpoints take `{"path": "<audio file>"}` and run the pipeline on the
//! blocking thread pool.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{
    classifier::{DiagnosisReport, DiagnosisService, GateLabel},
    error::{ApiError, ApiResult},
    AppState,
};

/// Request body shared by `/filter` and `/predict`
#[derive(Debug, Deserialize)]
pub struct AudioPathRequest {
    pub path: String,
}

/// Screening decision as returned by `/filter`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterStatus {
    Accepted,
    Rejected,
}

/// POST /filter response
#[derive(Debug, Serialize)]
pub struct FilterResponse {
    pub status: FilterStatus,
    pub label: GateLabel,
    pub prob: f64,
}

/// Validate the request body and confine its path to the audio root
fn audio_path(
    state: &AppState,
    body: Result<Json<AudioPathRequest>, JsonRejection>,
) -> ApiResult<PathBuf> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let path = request.path.trim();
    if path.is_empty() {
        return Err(ApiError::BadRequest("path must not be empty".to_string()));
    }
    state.audio_root.resolve(Path::new(path))
}

/// Run `job` against the service on the blocking pool
async fn run_blocking<T, F>(state: &AppState, job: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&DiagnosisService) -> crate::Result<T> + Send + 'static,
{
    let service = state.service.clone();
    tokio::task::spawn_blocking(move || job(&service))
        .await
        .map_err(|e| ApiError::Internal(format!("Inference task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// POST /filter
pub async fn filter(
    State(state): State<AppState>,
    body: Result<Json<AudioPathRequest>, JsonRejection>,
) -> ApiResult<Json<FilterResponse>> {
    let path = audio_path(&state, body)?;
    info!(path = %path.display(), "Filter request");

    let gate = run_blocking(&state, move |service| service.screen(&path)).await?;
    let status = if gate.label.is_respiratory() {
        FilterStatus::Accepted
    } else {
        FilterStatus::Rejected
    };

    Ok(Json(FilterResponse {
        status,
        label: gate.label,
        prob: gate.probability,
    }))
}

/// POST /predict
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<AudioPathRequest>, JsonRejection>,
) -> ApiResult<Json<DiagnosisReport>> {
    let path = audio_path(&state, body)?;
    info!(path = %path.display(), "Predict request");

    let report = run_blocking(&state, move |service| service.diagnose_report(&path)).await?;
    info!(
        label = report.diagnosis.label.as_str(),
        duration_seconds = report.duration_seconds,
        "Prediction complete"
    );

    Ok(Json(report))
}

/// Build classification routes
pub fn inference_routes() -> Router<AppState> {
    Router::new()
        .route("/filter", post(filter))
        .route("/predict", post(predict))
}
