//! Six-way respiratory disease classifier

use crate::audio::{Waveform, WaveformLoader};
use crate::error::{Error, ModelError, Result};
use crate::features::{
    pad_and_expand, FeatureExtractor, FusionFeatures, FUSION_MFCC, MEL_BANDS, SPECTRAL_CHANNELS,
};
use crate::models::{FusionInputs, FusionModel};
use ndarray::Array4;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Diagnosis classes, in model output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiseaseLabel {
    Bronchiectasis,
    Bronchiolitis,
    #[serde(rename = "COPD")]
    Copd,
    Healthy,
    Pneumonia,
    #[serde(rename = "URTI")]
    Urti,
}

impl DiseaseLabel {
    pub const ALL: [DiseaseLabel; 6] = [
        DiseaseLabel::Bronchiectasis,
        DiseaseLabel::Bronchiolitis,
        DiseaseLabel::Copd,
        DiseaseLabel::Healthy,
        DiseaseLabel::Pneumonia,
        DiseaseLabel::Urti,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiseaseLabel::Bronchiectasis => "Bronchiectasis",
            DiseaseLabel::Bronchiolitis => "Bronchiolitis",
            DiseaseLabel::Copd => "COPD",
            DiseaseLabel::Healthy => "Healthy",
            DiseaseLabel::Pneumonia => "Pneumonia",
            DiseaseLabel::Urti => "URTI",
        }
    }
}

impl fmt::Display for DiseaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicted class and the full probability table (4 decimals)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub label: DiseaseLabel,
    pub probabilities: BTreeMap<DiseaseLabel, f64>,
}

impl DiagnosisResult {
    /// Build from raw model probabilities in label order
    ///
    /// The winner is the first maximum of the raw values; the table is
    /// rounded half-to-even at 4 decimals.
    pub fn from_probabilities(probabilities: &[f32]) -> Result<Self> {
        if probabilities.len() != DiseaseLabel::ALL.len() {
            return Err(Error::ShapeMismatch {
                tensor: "fusion output",
                expected: vec![DiseaseLabel::ALL.len()],
                actual: vec![probabilities.len()],
            });
        }
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(ModelError::Inference(
                "fusion model produced non-finite probabilities".to_string(),
            )
            .into());
        }

        let mut best = 0;
        for (i, &p) in probabilities.iter().enumerate() {
            if p > probabilities[best] {
                best = i;
            }
        }

        let table = DiseaseLabel::ALL
            .iter()
            .zip(probabilities)
            .map(|(&label, &p)| (label, round4(p)))
            .collect();

        Ok(Self {
            label: DiseaseLabel::ALL[best],
            probabilities: table,
        })
    }
}

/// Round to 4 decimals, ties to even
pub fn round4(value: f32) -> f64 {
    (value as f64 * 1e4).round_ties_even() / 1e4
}

/// Diagnosis plus the analysed duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisReport {
    #[serde(flatten)]
    pub diagnosis: DiagnosisResult,
    pub duration_seconds: f64,
}

/// Fusion classifier adapter
pub struct FusionClassifier {
    loader: WaveformLoader,
    extractor: FeatureExtractor,
    time_frames: usize,
    model: Arc<dyn FusionModel>,
}

impl FusionClassifier {
    pub fn new(model: Arc<dyn FusionModel>, sample_rate: u32, time_frames: usize) -> Self {
        Self {
            loader: WaveformLoader::new(sample_rate),
            extractor: FeatureExtractor::new(sample_rate),
            time_frames,
            model,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.loader.target_sample_rate()
    }

    pub fn classify(&self, path: &Path) -> Result<DiagnosisReport> {
        let waveform = self.loader.load(path)?;
        let diagnosis = self.classify_waveform(&waveform)?;
        Ok(DiagnosisReport {
            diagnosis,
            duration_seconds: waveform.duration_seconds(),
        })
    }

    pub fn classify_waveform(&self, waveform: &Waveform) -> Result<DiagnosisResult> {
        let features = self.extractor.extract(waveform);
        let inputs = self.prepare_inputs(&features)?;
        let probabilities = self.model.predict(&inputs)?;
        let result = DiagnosisResult::from_probabilities(&probabilities)?;

        debug!(
            label = result.label.as_str(),
            frames = features.frames(),
            "Fusion prediction"
        );
        Ok(result)
    }

    /// Pad or truncate every tensor to the model's frame count and add
    /// batch and channel axes
    pub fn prepare_inputs(&self, features: &FusionFeatures) -> Result<FusionInputs> {
        let inputs = FusionInputs {
            mel: pad_and_expand(features.mel.view(), self.time_frames),
            mfcc: pad_and_expand(features.mfcc.view(), self.time_frames),
            spectral: pad_and_expand(features.spectral.view(), self.time_frames),
        };

        self.check_shape("mel", &inputs.mel, MEL_BANDS)?;
        self.check_shape("mfcc", &inputs.mfcc, FUSION_MFCC)?;
        self.check_shape("spectral", &inputs.spectral, SPECTRAL_CHANNELS)?;
        Ok(inputs)
    }

    fn check_shape(&self, tensor: &'static str, input: &Array4<f32>, channels: usize) -> Result<()> {
        let expected = vec![1, channels, self.time_frames, 1];
        if input.shape() == expected.as_slice() {
            return Ok(());
        }
        debug_assert!(false, "{} input has shape {:?}", tensor, input.shape());
        Err(Error::ShapeMismatch {
            tensor,
            expected,
            actual: input.shape().to_vec(),
        })
    }
}
