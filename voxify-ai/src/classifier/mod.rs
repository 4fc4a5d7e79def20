//! Classifier adapters
//!
//! - [`gate`]: respiratory / non-respiratory screening
//! - [`fusion`]: six-way disease diagnosis
//! - [`service`]: [`DiagnosisService`], which owns both

pub mod fusion;
pub mod gate;
pub mod service;

pub use fusion::{round4, DiagnosisReport, DiagnosisResult, DiseaseLabel, FusionClassifier};
pub use gate::{mfcc_summary, GateClassifier, GateLabel, GateResult};
pub use service::{DiagnosisService, PipelineConfig, Screening};
