//! Pretrained model capabilities
//!
//! The classifier adapters only see these traits. Models are loaded once at
//! startup and shared read-only behind `Arc<dyn ...>`; implementations that
//! need exclusive access to a runtime session serialize calls internally.
//!
//! The ONNX Runtime backend lives in [`onnx`] behind the `onnx` cargo feature.

#[cfg(feature = "onnx")]
pub mod onnx;

use crate::error::ModelError;
use ndarray::{Array4, ArrayView1};
use std::path::Path;
use std::sync::Arc;

/// Raw output of the binary gate classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatePrediction {
    /// Predicted class (1 = respiratory, 0 = not respiratory)
    pub label: i64,
    /// Probability of class 1
    pub probability: f32,
}

/// Binary respiratory / non-respiratory classifier over a 40-value MFCC summary
pub trait GateModel: Send + Sync {
    fn predict(&self, features: ArrayView1<'_, f32>) -> Result<GatePrediction, ModelError>;
}

/// Model inputs for the fusion classifier, each shaped `(1, C, T, 1)`
#[derive(Debug, Clone, PartialEq)]
pub struct FusionInputs {
    pub mel: Array4<f32>,
    pub mfcc: Array4<f32>,
    pub spectral: Array4<f32>,
}

/// Six-way disease classifier over mel, MFCC and spectral-stack inputs
pub trait FusionModel: Send + Sync {
    /// Class probabilities in label order
    fn predict(&self, inputs: &FusionInputs) -> Result<Vec<f32>, ModelError>;
}

/// Load the gate model artifact at `path`
///
/// Without the `onnx` feature there is no runtime to load it with, and this
/// fails with [`ModelError::Load`].
pub fn load_gate_model(path: &Path) -> Result<Arc<dyn GateModel>, ModelError> {
    ensure_exists(path)?;
    backend::gate(path)
}

/// Load the fusion model artifact at `path`
pub fn load_fusion_model(path: &Path) -> Result<Arc<dyn FusionModel>, ModelError> {
    ensure_exists(path)?;
    backend::fusion(path)
}

fn ensure_exists(path: &Path) -> Result<(), ModelError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ModelError::NotFound(path.to_path_buf()))
    }
}

#[cfg(feature = "onnx")]
mod backend {
    use super::onnx::{OnnxFusionModel, OnnxGateModel};
    use super::{FusionModel, GateModel, ModelError};
    use std::path::Path;
    use std::sync::Arc;

    pub fn gate(path: &Path) -> Result<Arc<dyn GateModel>, ModelError> {
        Ok(Arc::new(OnnxGateModel::load(path)?))
    }

    pub fn fusion(path: &Path) -> Result<Arc<dyn FusionModel>, ModelError> {
        Ok(Arc::new(OnnxFusionModel::load(path)?))
    }
}

#[cfg(not(feature = "onnx"))]
mod backend {
    use super::{FusionModel, GateModel, ModelError};
    use std::path::Path;
    use std::sync::Arc;

    fn runtime_missing(path: &Path) -> ModelError {
        ModelError::Load {
            path: path.to_path_buf(),
            reason: "built without the `onnx` feature; no inference runtime available"
                .to_string(),
        }
    }

    pub fn gate(path: &Path) -> Result<Arc<dyn GateModel>, ModelError> {
        Err(runtime_missing(path))
    }

    pub fn fusion(path: &Path) -> Result<Arc<dyn FusionModel>, ModelError> {
        Err(runtime_missing(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_artifact_is_not_found() {
        let err = load_gate_model(Path::new("/nonexistent/gate.onnx")).err();
        assert!(matches!(err, Some(ModelError::NotFound(_))));

        let err = load_fusion_model(Path::new("/nonexistent/fusion.onnx")).err();
        assert!(matches!(err, Some(ModelError::NotFound(_))));
    }

    #[test]
    fn test_unloadable_artifact_is_load_error() {
        // Not a valid model either way: the runtime rejects it, or there is
        // no runtime compiled in
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"not a model").unwrap();

        let err = load_fusion_model(file.path()).err();
        assert!(matches!(err, Some(ModelError::Load { .. })));
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn test_default_build_hands_artifacts_to_the_runtime() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"not a model").unwrap();

        match load_gate_model(file.path()).err() {
            Some(ModelError::Load { reason, .. }) => {
                assert!(!reason.contains("built without"), "reason: {}", reason)
            }
            other => panic!("expected a load error, got {:?}", other.map(|e| e.to_string())),
        }
    }
}
