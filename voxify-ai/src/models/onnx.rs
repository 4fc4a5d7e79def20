//! ONNX Runtime backend
//!
//! Each model owns one session behind a `Mutex`: running a session needs
//! `&mut`, so concurrent requests to the same model are serialized.
//!
//! Artifact contracts:
//! - gate: one f32 input `(1, 40)`; outputs `label: i64 (1)` then
//!   `probabilities: f32 (1, 2)` (exported without a ZipMap node)
//! - fusion: three f32 inputs in order mel `(1, 128, T, 1)`, mfcc
//!   `(1, 40, T, 1)`, spectral `(1, 146, T, 1)`; first output f32 `(1, 6)`

use super::{FusionInputs, FusionModel, GateModel, GatePrediction};
use crate::error::ModelError;
use ndarray::{Array2, ArrayView1};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::fmt::Display;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

fn open_session(path: &Path) -> Result<Session, ModelError> {
    let session = Session::builder()
        .map_err(load_error(path))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(load_error(path))?
        .commit_from_file(path)
        .map_err(load_error(path))?;

    info!(
        "Loaded ONNX model {} ({} inputs, {} outputs)",
        path.display(),
        session.inputs.len(),
        session.outputs.len()
    );
    Ok(session)
}

fn lock(session: &Mutex<Session>) -> Result<MutexGuard<'_, Session>, ModelError> {
    session
        .lock()
        .map_err(|e| ModelError::Inference(format!("Session lock poisoned: {}", e)))
}

fn load_error<E: Display>(path: &Path) -> impl Fn(E) -> ModelError + '_ {
    move |e| ModelError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn inference_error<E: Display>(context: &str) -> impl Fn(E) -> ModelError + '_ {
    move |e| ModelError::Inference(format!("{}: {}", context, e))
}

/// Gate classifier on ONNX Runtime
pub struct OnnxGateModel {
    session: Mutex<Session>,
}

impl OnnxGateModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        Ok(Self {
            session: Mutex::new(open_session(path)?),
        })
    }
}

impl GateModel for OnnxGateModel {
    fn predict(&self, features: ArrayView1<'_, f32>) -> Result<GatePrediction, ModelError> {
        let batch: Array2<f32> = features.to_owned().insert_axis(ndarray::Axis(0));
        let input =
            Tensor::from_array(batch).map_err(inference_error("Failed to create input tensor"))?;

        let mut session = lock(&self.session)?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(inference_error("Gate inference failed"))?;

        if outputs.len() < 2 {
            return Err(ModelError::OutputShape {
                expected: 2,
                actual: outputs.len(),
            });
        }

        let labels = outputs[0]
            .try_extract_array::<i64>()
            .map_err(inference_error("Failed to read gate label"))?;
        let label = labels.iter().next().copied().ok_or(ModelError::OutputShape {
            expected: 1,
            actual: 0,
        })?;

        let probabilities = outputs[1]
            .try_extract_array::<f32>()
            .map_err(inference_error("Failed to read gate probabilities"))?;
        if probabilities.len() != 2 {
            return Err(ModelError::OutputShape {
                expected: 2,
                actual: probabilities.len(),
            });
        }
        let probability = probabilities.iter().nth(1).copied().unwrap_or_default();

        Ok(GatePrediction { label, probability })
    }
}

/// Fusion classifier on ONNX Runtime
pub struct OnnxFusionModel {
    session: Mutex<Session>,
}

impl OnnxFusionModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        Ok(Self {
            session: Mutex::new(open_session(path)?),
        })
    }
}

impl FusionModel for OnnxFusionModel {
    fn predict(&self, inputs: &FusionInputs) -> Result<Vec<f32>, ModelError> {
        let context = "Failed to create input tensor";
        let mel = Tensor::from_array(inputs.mel.clone()).map_err(inference_error(context))?;
        let mfcc = Tensor::from_array(inputs.mfcc.clone()).map_err(inference_error(context))?;
        let spectral =
            Tensor::from_array(inputs.spectral.clone()).map_err(inference_error(context))?;

        let mut session = lock(&self.session)?;
        let outputs = session
            .run(ort::inputs![mel, mfcc, spectral])
            .map_err(inference_error("Fusion inference failed"))?;

        let probabilities = outputs[0]
            .try_extract_array::<f32>()
            .map_err(inference_error("Failed to read fusion output"))?;

        Ok(probabilities.iter().copied().collect())
    }
}
