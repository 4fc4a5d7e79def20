//! Deterministic stand-ins for the pretrained models

use ndarray::ArrayView1;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use voxify_ai::features::{FUSION_MFCC, GATE_MFCC, MEL_BANDS, SPECTRAL_CHANNELS};
use voxify_ai::models::{FusionInputs, FusionModel, GateModel, GatePrediction};
use voxify_ai::{DiagnosisService, ModelError, PipelineConfig};

/// Gate that scores how much the first cepstral coefficient (overall
/// loudness) moves over time: breathing cycles swing it widely, steady
/// tones and silence barely move it.
pub struct SpreadGate;

impl SpreadGate {
    pub const THRESHOLD: f32 = 100.0;
}

impl GateModel for SpreadGate {
    fn predict(&self, features: ArrayView1<'_, f32>) -> Result<GatePrediction, ModelError> {
        if features.len() != 2 * GATE_MFCC {
            return Err(ModelError::Inference(format!(
                "expected {} features, got {}",
                2 * GATE_MFCC,
                features.len()
            )));
        }
        let c0_std = features[GATE_MFCC];
        let probability = 1.0 / (1.0 + (-(c0_std - Self::THRESHOLD) / 20.0).exp());
        Ok(GatePrediction {
            label: i64::from(probability > 0.5),
            probability,
        })
    }
}

fn check_shape(name: &str, shape: &[usize], channels: usize) -> Result<(), ModelError> {
    if shape.len() == 4 && shape[0] == 1 && shape[1] == channels && shape[3] == 1 {
        Ok(())
    } else {
        Err(ModelError::Inference(format!("bad {} shape {:?}", name, shape)))
    }
}

/// Softmax over logits derived from input means
pub struct SoftmaxFusion;

impl FusionModel for SoftmaxFusion {
    fn predict(&self, inputs: &FusionInputs) -> Result<Vec<f32>, ModelError> {
        check_shape("mel", inputs.mel.shape(), MEL_BANDS)?;
        check_shape("mfcc", inputs.mfcc.shape(), FUSION_MFCC)?;
        check_shape("spectral", inputs.spectral.shape(), SPECTRAL_CHANNELS)?;

        let mean = |a: &ndarray::Array4<f32>| a.mean().unwrap_or(0.0);
        let logits = [
            mean(&inputs.mel),
            mean(&inputs.mfcc) / 1000.0,
            mean(&inputs.spectral),
            0.0,
            0.0,
            0.0,
        ];
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exp: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f32 = exp.iter().sum();
        Ok(exp.into_iter().map(|e| e / total).collect())
    }
}

/// Fusion model that records how often it ran
#[derive(Default)]
pub struct CountingFusion {
    calls: AtomicUsize,
}

impl CountingFusion {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FusionModel for CountingFusion {
    fn predict(&self, inputs: &FusionInputs) -> Result<Vec<f32>, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SoftmaxFusion.predict(inputs)
    }
}

/// Service over the stub models with default pipeline settings
pub fn test_service() -> DiagnosisService {
    DiagnosisService::new(
        Arc::new(SpreadGate),
        Arc::new(SoftmaxFusion),
        PipelineConfig::default(),
    )
    .unwrap()
}
