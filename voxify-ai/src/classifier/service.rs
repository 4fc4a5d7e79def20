//! Diagnosis service: the gate and fusion adapters behind one handle

use super::fusion::{DiagnosisReport, DiagnosisResult, FusionClassifier};
use super::gate::{GateClassifier, GateResult};
use crate::error::Result;
use crate::features::TIME_FRAMES;
use crate::models::{FusionModel, GateModel};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use voxify_common::PipelineSettings;

/// Sample rates and model frame count used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub fusion_sample_rate: u32,
    pub gate_sample_rate: u32,
    pub time_frames: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fusion_sample_rate: 8000,
            gate_sample_rate: 16_000,
            time_frames: TIME_FRAMES,
        }
    }
}

impl PipelineConfig {
    /// Validate settings read from the config file
    pub fn from_settings(settings: &PipelineSettings) -> Result<Self> {
        let config = Self {
            fusion_sample_rate: settings.fusion_sample_rate,
            gate_sample_rate: settings.gate_sample_rate,
            time_frames: settings.time_frames,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| -> Result<()> {
            Err(voxify_common::Error::Config(msg.to_string()).into())
        };
        if self.fusion_sample_rate == 0 {
            return invalid("fusion sample rate must be > 0");
        }
        if self.gate_sample_rate == 0 {
            return invalid("gate sample rate must be > 0");
        }
        if self.time_frames == 0 {
            return invalid("time frames must be > 0");
        }
        Ok(())
    }
}

/// Outcome of screening followed by diagnosis
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Screening {
    /// The gate found no respiratory sound; the fusion model was not run
    Rejected(GateResult),
    Accepted {
        gate: GateResult,
        diagnosis: DiagnosisReport,
    },
}

/// Immutable classification service shared by all requests
pub struct DiagnosisService {
    gate: GateClassifier,
    fusion: FusionClassifier,
    config: PipelineConfig,
}

impl DiagnosisService {
    pub fn new(
        gate_model: Arc<dyn GateModel>,
        fusion_model: Arc<dyn FusionModel>,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;

        info!(
            fusion_sample_rate = config.fusion_sample_rate,
            gate_sample_rate = config.gate_sample_rate,
            time_frames = config.time_frames,
            "Diagnosis service ready"
        );

        Ok(Self {
            gate: GateClassifier::new(gate_model, config.gate_sample_rate),
            fusion: FusionClassifier::new(
                fusion_model,
                config.fusion_sample_rate,
                config.time_frames,
            ),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Is this a respiratory recording?
    pub fn screen(&self, path: &Path) -> Result<GateResult> {
        self.gate.classify(path)
    }

    pub fn diagnose(&self, path: &Path) -> Result<DiagnosisResult> {
        Ok(self.fusion.classify(path)?.diagnosis)
    }

    /// Diagnosis together with the analysed duration
    pub fn diagnose_report(&self, path: &Path) -> Result<DiagnosisReport> {
        self.fusion.classify(path)
    }

    /// Screen first and only diagnose accepted recordings
    pub fn screen_then_diagnose(&self, path: &Path) -> Result<Screening> {
        let gate = self.screen(path)?;
        if !gate.label.is_respiratory() {
            info!(
                path = %path.display(),
                probability = gate.probability,
                "Recording rejected by gate"
            );
            return Ok(Screening::Rejected(gate));
        }

        let diagnosis = self.diagnose_report(path)?;
        Ok(Screening::Accepted { gate, diagnosis })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_default_matches_settings_default() {
        let config = PipelineConfig::from_settings(&PipelineSettings::default()).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_zero_values_rejected() {
        let settings = PipelineSettings {
            time_frames: 0,
            ..PipelineSettings::default()
        };
        let err = PipelineConfig::from_settings(&settings).unwrap_err();
        assert!(matches!(err, Error::Common(voxify_common::Error::Config(_))));

        let config = PipelineConfig {
            gate_sample_rate: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
