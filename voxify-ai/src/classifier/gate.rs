//! Respiratory-sound gate
//!
//! Decides whether a recording contains breathing sounds at all before it is
//! sent to the disease classifier. Audio is decoded at 16 kHz without
//! normalization; the model sees the per-coefficient mean and population
//! standard deviation of 20 MFCCs.

use crate::audio::{Waveform, WaveformLoader};
use crate::error::{ModelError, Result};
use crate::features::{MfccExtractor, MfccParams, GATE_MFCC};
use crate::models::GateModel;
use ndarray::{concatenate, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Gate verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateLabel {
    #[serde(rename = "Respiratory")]
    Respiratory,
    #[serde(rename = "Non-Respiratory")]
    NonRespiratory,
}

impl GateLabel {
    /// Map the model's class index; only 0 and 1 exist
    pub fn from_class(class: i64) -> std::result::Result<Self, ModelError> {
        match class {
            1 => Ok(GateLabel::Respiratory),
            0 => Ok(GateLabel::NonRespiratory),
            other => Err(ModelError::UnexpectedLabel(other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GateLabel::Respiratory => "Respiratory",
            GateLabel::NonRespiratory => "Non-Respiratory",
        }
    }

    pub fn is_respiratory(&self) -> bool {
        matches!(self, GateLabel::Respiratory)
    }
}

impl fmt::Display for GateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gate outcome; `probability` is P(respiratory), unrounded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub label: GateLabel,
    pub probability: f64,
}

/// Per-coefficient mean followed by per-coefficient population standard
/// deviation over time: `(n, T)` becomes `2n` values
pub fn mfcc_summary(mfcc: &Array2<f32>) -> Array1<f32> {
    let n = mfcc.nrows();
    let mean = mfcc
        .mean_axis(Axis(1))
        .unwrap_or_else(|| Array1::zeros(n));
    let std = if mfcc.ncols() == 0 {
        Array1::zeros(n)
    } else {
        mfcc.std_axis(Axis(1), 0.0)
    };

    concatenate(Axis(0), &[mean.view(), std.view()]).unwrap_or_else(|_| Array1::zeros(2 * n))
}

/// Gate classifier adapter
pub struct GateClassifier {
    loader: WaveformLoader,
    mfcc: MfccExtractor,
    model: Arc<dyn GateModel>,
}

impl GateClassifier {
    pub fn new(model: Arc<dyn GateModel>, sample_rate: u32) -> Self {
        Self {
            loader: WaveformLoader::without_normalization(sample_rate),
            mfcc: MfccExtractor::new(sample_rate, MfccParams::with_coefficients(GATE_MFCC)),
            model,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.loader.target_sample_rate()
    }

    /// Decode `path` and classify it
    pub fn classify(&self, path: &Path) -> Result<GateResult> {
        let waveform = self.loader.load(path)?;
        self.classify_waveform(&waveform)
    }

    pub fn classify_waveform(&self, waveform: &Waveform) -> Result<GateResult> {
        let features = self.features(waveform);
        let prediction = self.model.predict(features.view())?;
        let label = GateLabel::from_class(prediction.label)?;

        debug!(
            label = label.as_str(),
            probability = prediction.probability,
            "Gate prediction"
        );

        Ok(GateResult {
            label,
            probability: prediction.probability as f64,
        })
    }

    /// 40-value MFCC summary the gate model consumes
    pub fn features(&self, waveform: &Waveform) -> Array1<f32> {
        let mfcc = if waveform.sample_rate() == self.sample_rate() {
            self.mfcc.compute(waveform.samples())
        } else {
            MfccExtractor::new(waveform.sample_rate(), *self.mfcc.params())
                .compute(waveform.samples())
        };
        mfcc_summary(&mfcc)
    }
}
