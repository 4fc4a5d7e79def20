//! Audio input: decoding, resampling and waveform normalization
//!
//! The [`Waveform`] type is the hand-off point between the loader and the
//! feature extractors. It can only be built from a non-empty, all-finite
//! sample buffer, so downstream spectral code never sees degenerate input
//! produced by the loader.

pub mod decoder;
pub mod loader;
pub mod resampler;

pub use decoder::{decode_audio_file, DecodedAudio};
pub use loader::{peak_normalize, WaveformLoader};
pub use resampler::resample_mono;

use crate::error::DecodeError;

/// Mono audio at a fixed sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    /// Wrap mono samples, rejecting empty or non-finite buffers
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, DecodeError> {
        if sample_rate == 0 {
            return Err(DecodeError::InvalidSampleRate(sample_rate));
        }
        if samples.is_empty() {
            return Err(DecodeError::Empty);
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(DecodeError::NonFinite);
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; an empty waveform cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(Waveform::new(vec![], 8000), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_rejects_non_finite() {
        let result = Waveform::new(vec![0.0, f32::NAN, 0.1], 8000);
        assert!(matches!(result, Err(DecodeError::NonFinite)));

        let result = Waveform::new(vec![f32::INFINITY], 8000);
        assert!(matches!(result, Err(DecodeError::NonFinite)));
    }

    #[test]
    fn test_rejects_zero_rate() {
        let result = Waveform::new(vec![0.0; 10], 0);
        assert!(matches!(result, Err(DecodeError::InvalidSampleRate(0))));
    }

    #[test]
    fn test_duration() {
        let waveform = Waveform::new(vec![0.0; 40_000], 8000).unwrap();
        assert_eq!(waveform.len(), 40_000);
        assert!(!waveform.is_empty());
        assert!((waveform.duration_seconds() - 5.0).abs() < 1e-12);
    }
}
