//! Spectral feature extraction
//!
//! [`FeatureExtractor`] turns a waveform into the three tensors the fusion
//! classifier consumes:
//!
//! - mel spectrogram `(128, T)` over the bounds of [`FrequencyBounds`]
//! - MFCC `(40, T)`
//! - spectral stack `(146, T)` = mel ‖ chroma (12) ‖ tonnetz (6)
//!
//! All three share one frame count `T`. The tonnetz can degenerate (for
//! instance when its top semitone band lies above Nyquist); it is then
//! replaced by zeros and extraction still succeeds.

pub mod bounds;
pub mod chroma;
pub mod harmonic;
pub mod mel;
pub mod mfcc;
pub mod padding;
pub mod stft;
pub mod tonnetz;
pub mod tuning;

pub use bounds::FrequencyBounds;
pub use mfcc::{MfccExtractor, MfccParams};
pub use padding::{fit_frames, pad_and_expand, truncate_frames};

use crate::audio::Waveform;
use chroma::ChromaExtractor;
use ndarray::{concatenate, Array2, Axis};
use stft::Stft;
use thiserror::Error;
use tonnetz::TonnetzExtractor;
use tracing::debug;

pub const MEL_BANDS: usize = 128;
pub const FUSION_MFCC: usize = 40;
pub const GATE_MFCC: usize = 20;
pub const CHROMA_BINS: usize = 12;
pub const TONNETZ_DIMS: usize = 6;
pub const SPECTRAL_CHANNELS: usize = MEL_BANDS + CHROMA_BINS + TONNETZ_DIMS;

/// Spectrogram analysis window
pub const N_FFT: usize = 512;
/// Spectrogram hop length
pub const HOP_LENGTH: usize = 256;
/// Frames every fusion input is padded or truncated to
pub const TIME_FRAMES: usize = 2579;

/// Reason a feature could not be computed and was replaced by zeros
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionDegenerate {
    #[error("semitone band edge {upper_hz:.1} Hz exceeds Nyquist {nyquist_hz:.1} Hz")]
    AboveNyquist { upper_hz: f64, nyquist_hz: f64 },

    #[error("signal is empty")]
    EmptySignal,

    #[error("signal contains non-finite values")]
    NonFiniteSamples,

    #[error("harmonic decomposition failed: {0}")]
    HarmonicDecomposition(String),
}

/// Mel, MFCC and spectral-stack tensors of one recording
#[derive(Debug, Clone, PartialEq)]
pub struct FusionFeatures {
    pub mel: Array2<f32>,
    pub mfcc: Array2<f32>,
    pub spectral: Array2<f32>,
}

impl FusionFeatures {
    /// Frame count of the spectral stack
    pub fn frames(&self) -> usize {
        self.spectral.ncols()
    }
}

/// Feature extractor for one sample rate
///
/// Filter banks and FFT plans are built once in [`FeatureExtractor::new`]
/// and reused for every call.
#[derive(Debug)]
pub struct FeatureExtractor {
    sample_rate: u32,
    bounds: FrequencyBounds,
    stft: Stft,
    mel_filters: Array2<f32>,
    mfcc: MfccExtractor,
    chroma: ChromaExtractor,
    tonnetz: TonnetzExtractor,
}

impl FeatureExtractor {
    pub fn new(sample_rate: u32) -> Self {
        let bounds = FrequencyBounds::for_sample_rate(sample_rate);
        let mel_filters = mel::mel_filter_bank(
            sample_rate,
            N_FFT,
            MEL_BANDS,
            bounds.fmin as f64,
            bounds.fmax as f64,
        );

        Self {
            sample_rate,
            bounds,
            stft: Stft::new(N_FFT, HOP_LENGTH),
            mel_filters,
            mfcc: MfccExtractor::new(sample_rate, MfccParams::with_coefficients(FUSION_MFCC)),
            chroma: ChromaExtractor::new(sample_rate, N_FFT),
            tonnetz: TonnetzExtractor::new(sample_rate, HOP_LENGTH),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bounds(&self) -> FrequencyBounds {
        self.bounds
    }

    /// Extract co-registered features from a waveform
    ///
    /// Every tensor is cut to the shortest frame count among mel, MFCC,
    /// chroma and tonnetz, dropping trailing frames.
    pub fn extract(&self, waveform: &Waveform) -> FusionFeatures {
        if waveform.sample_rate() != self.sample_rate {
            debug!(
                "Waveform at {} Hz, extractor at {} Hz; building a matching extractor",
                waveform.sample_rate(),
                self.sample_rate
            );
            return FeatureExtractor::new(waveform.sample_rate()).extract(waveform);
        }

        let samples = waveform.samples();
        let power = self.stft.power(samples);
        let mel = mel::apply_filter_bank(&self.mel_filters, &power);
        let mfcc = self.mfcc.compute(samples);
        let chroma = self.chroma.compute(&power).unwrap_or_else(|reason| {
            debug!(%reason, "Chroma degenerate, using zeros");
            Array2::zeros((CHROMA_BINS, power.ncols()))
        });
        let tonnetz = self.tonnetz_or_zeros(samples, chroma.ncols());

        let frames = [mel.ncols(), mfcc.ncols(), chroma.ncols(), tonnetz.ncols()]
            .into_iter()
            .min()
            .unwrap_or(0);

        let mel = truncate_frames(&mel, frames);
        let mfcc = truncate_frames(&mfcc, frames);
        let spectral = stack_spectral(
            &mel,
            &truncate_frames(&chroma, frames),
            &truncate_frames(&tonnetz, frames),
        );

        debug!(
            frames,
            sample_rate = self.sample_rate,
            "Extracted fusion features"
        );

        FusionFeatures {
            mel,
            mfcc,
            spectral,
        }
    }

    /// Best-effort extraction from raw samples
    ///
    /// Each tensor falls back to zeros on its own. Mel, chroma and tonnetz
    /// are aligned to their shortest frame count; the MFCC keeps its own.
    pub fn extract_global(&self, samples: &[f32]) -> FusionFeatures {
        let power = match self.checked_power(samples) {
            Ok(power) => power,
            Err(reason) => {
                debug!(%reason, "Spectrogram unavailable, all features zeroed");
                return FusionFeatures {
                    mel: Array2::zeros((MEL_BANDS, 1)),
                    mfcc: Array2::zeros((FUSION_MFCC, 1)),
                    spectral: Array2::zeros((SPECTRAL_CHANNELS, 1)),
                };
            }
        };

        let mel = ensure_finite(mel::apply_filter_bank(&self.mel_filters, &power))
            .unwrap_or_else(|reason| {
                debug!(%reason, "Mel degenerate, using zeros");
                Array2::zeros((MEL_BANDS, 1))
            });

        let mfcc = ensure_finite(self.mfcc.compute(samples)).unwrap_or_else(|reason| {
            debug!(%reason, "MFCC degenerate, using zeros");
            Array2::zeros((FUSION_MFCC, 1))
        });

        let chroma = self.chroma.compute(&power).unwrap_or_else(|reason| {
            debug!(%reason, "Chroma degenerate, using zeros");
            Array2::zeros((CHROMA_BINS, mel.ncols()))
        });

        let tonnetz = self.tonnetz_or_zeros(samples, chroma.ncols());

        let frames = mel.ncols().min(chroma.ncols()).min(tonnetz.ncols());
        let mel = truncate_frames(&mel, frames);
        let spectral = stack_spectral(
            &mel,
            &truncate_frames(&chroma, frames),
            &truncate_frames(&tonnetz, frames),
        );

        FusionFeatures {
            mel,
            mfcc,
            spectral,
        }
    }

    fn checked_power(&self, samples: &[f32]) -> Result<Array2<f32>, ExtractionDegenerate> {
        if samples.is_empty() {
            return Err(ExtractionDegenerate::EmptySignal);
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(ExtractionDegenerate::NonFiniteSamples);
        }
        Ok(self.stft.power(samples))
    }

    fn tonnetz_or_zeros(&self, samples: &[f32], frames: usize) -> Array2<f32> {
        self.tonnetz.compute(samples).unwrap_or_else(|reason| {
            debug!(%reason, "Tonnetz degenerate, using zeros");
            Array2::zeros((TONNETZ_DIMS, frames))
        })
    }
}

fn ensure_finite(tensor: Array2<f32>) -> Result<Array2<f32>, ExtractionDegenerate> {
    if tensor.iter().all(|v| v.is_finite()) {
        Ok(tensor)
    } else {
        Err(ExtractionDegenerate::NonFiniteSamples)
    }
}

/// Stack mel, chroma and tonnetz rows; all three must share a frame count
fn stack_spectral(mel: &Array2<f32>, chroma: &Array2<f32>, tonnetz: &Array2<f32>) -> Array2<f32> {
    concatenate(Axis(0), &[mel.view(), chroma.view(), tonnetz.view()]).unwrap_or_else(|_| {
        // Only reachable if the callers' frame alignment is broken
        debug_assert!(false, "spectral stack frame counts disagree");
        Array2::zeros((SPECTRAL_CHANNELS, mel.ncols()))
    })
}
