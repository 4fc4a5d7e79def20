//! voxify-ai: respiratory sound classification
//!
//! Audio loading ([`audio`]), spectral features ([`features`]), model
//! capabilities ([`models`]) and the gate/fusion adapters ([`classifier`]),
//! plus the axum router served by the `voxify-ai` binary.

pub mod api;
pub mod audio;
pub mod classifier;
pub mod error;
pub mod features;
pub mod models;

pub use crate::classifier::{DiagnosisService, PipelineConfig};
pub use crate::error::{ApiError, ApiResult, DecodeError, Error, ModelError, Result};

use crate::api::AudioRoot;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Classification service with both models loaded
    pub service: Arc<DiagnosisService>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Where request paths may point
    pub audio_root: AudioRoot,
}

impl AppState {
    /// State with no path restriction
    pub fn new(service: Arc<DiagnosisService>) -> Self {
        Self {
            service,
            startup_time: Utc::now(),
            audio_root: AudioRoot::unrestricted(),
        }
    }

    pub fn with_audio_root(mut self, audio_root: AudioRoot) -> Self {
        self.audio_root = audio_root;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::inference_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
