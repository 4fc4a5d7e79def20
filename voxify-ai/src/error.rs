//! Error types for voxify-ai
//!
//! - [`DecodeError`]: audio could not be turned into a waveform
//! - [`ModelError`]: a pretrained model failed to load or to run
//! - [`Error`]: pipeline-level error returned by the classifier adapters
//! - [`ApiError`]: HTTP-facing error with a JSON body
//!
//! Feature-extraction degeneracies are not errors at this level; see
//! [`crate::features::ExtractionDegenerate`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Audio decoding errors
#[derive(Debug, Error)]
pub enum DecodeError {
    /// File could not be opened
    #[error("Failed to open audio file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Container format not recognised
    #[error("Failed to probe audio file {path}: {reason}")]
    Probe { path: PathBuf, reason: String },

    /// Container holds no decodable audio track
    #[error("No audio track found in {0}")]
    NoAudioTrack(PathBuf),

    /// Track does not declare a sample rate
    #[error("Sample rate unknown for {0}")]
    MissingSampleRate(PathBuf),

    /// Corrupt packet or unsupported codec
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// Decoding produced zero samples
    #[error("Audio contains no samples")]
    Empty,

    /// Decoded samples contain NaN or infinity
    #[error("Audio contains non-finite samples")]
    NonFinite,

    /// Sample rate of zero
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// Sample rate conversion failed
    #[error("Resampling failed: {0}")]
    Resample(String),
}

impl DecodeError {
    /// Message safe to return to a client: no paths, no OS error text
    ///
    /// A missing file and a file that is not audio read the same.
    pub fn client_message(&self) -> &'static str {
        match self {
            DecodeError::Open { .. }
            | DecodeError::Probe { .. }
            | DecodeError::NoAudioTrack(_)
            | DecodeError::MissingSampleRate(_)
            | DecodeError::Decode { .. } => "Audio file could not be read or decoded",
            DecodeError::Empty => "Audio contains no samples",
            DecodeError::NonFinite => "Audio contains non-finite samples",
            DecodeError::InvalidSampleRate(_) | DecodeError::Resample(_) => {
                "Audio could not be resampled"
            }
        }
    }
}

/// Pretrained model errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// Model artifact does not exist
    #[error("Model file not found: {0}")]
    NotFound(PathBuf),

    /// Model artifact exists but the runtime rejected it
    #[error("Failed to load model {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// Runtime failure while running inference
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Binary classifier produced a class outside {0, 1}
    #[error("Unexpected class label from gate model: {0}")]
    UnexpectedLabel(i64),

    /// Model output does not have the expected shape
    #[error("Unexpected model output: expected {expected} values, got {actual}")]
    OutputShape { expected: usize, actual: usize },
}

/// Main error type for the classification pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Audio decode errors
    #[error("Audio decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A model could not be loaded at startup
    #[error("Model unavailable ({model}): {source}")]
    ModelUnavailable {
        model: &'static str,
        #[source]
        source: ModelError,
    },

    /// A loaded model failed during a request
    #[error("Model error: {0}")]
    Inference(#[from] ModelError),

    /// Tensor handed to a model has the wrong shape (internal logic error)
    #[error("Shape mismatch for {tensor}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        tensor: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// voxify-common error
    #[error("Common error: {0}")]
    Common(#[from] voxify_common::Error),
}

/// Convenience Result type using the pipeline Error
pub type Result<T> = std::result::Result<T, Error>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Requested path is outside the audio directory (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Audio could not be decoded (422)
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Model failed while serving the request (500)
    #[error("Model error: {0}")]
    Model(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Decode(e) => {
                warn!(error = %e, "Audio decode failed");
                ApiError::Decode(e.client_message().to_string())
            }
            Error::Inference(e) => ApiError::Model(e.to_string()),
            e @ Error::ModelUnavailable { .. } => ApiError::Model(e.to_string()),
            e @ Error::ShapeMismatch { .. } => ApiError::Internal(e.to_string()),
            Error::Common(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "PATH_NOT_ALLOWED", msg),
            ApiError::Decode(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "DECODE_ERROR", msg),
            ApiError::Model(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "MODEL_ERROR", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;
