//! Waveform loader
//!
//! Decodes an audio file, resamples it to the target rate of the pipeline
//! path and (optionally) peak-normalizes it.

use super::decoder::decode_audio_file;
use super::resampler::resample_mono;
use super::Waveform;
use crate::error::DecodeError;
use std::path::Path;
use tracing::debug;

/// Loads audio files as mono [`Waveform`]s at a fixed sample rate
#[derive(Debug, Clone, Copy)]
pub struct WaveformLoader {
    /// Target sample rate for output samples
    target_sample_rate: u32,
    /// Peak-normalize after resampling
    normalize: bool,
}

impl WaveformLoader {
    /// Loader that resamples to `target_sample_rate` and peak-normalizes
    pub fn new(target_sample_rate: u32) -> Self {
        Self {
            target_sample_rate,
            normalize: true,
        }
    }

    /// Loader that keeps the decoded amplitude untouched
    pub fn without_normalization(target_sample_rate: u32) -> Self {
        Self {
            target_sample_rate,
            normalize: false,
        }
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Decode `file_path` into a mono waveform at the target rate
    ///
    /// # Errors
    /// * [`DecodeError`] if the file is unreadable, not audio, or decodes to
    ///   zero samples. No partial waveform is returned.
    pub fn load<P: AsRef<Path>>(&self, file_path: P) -> Result<Waveform, DecodeError> {
        let path = file_path.as_ref();
        let decoded = decode_audio_file(path)?;

        if decoded.samples.is_empty() {
            return Err(DecodeError::Empty);
        }

        debug!(
            "Native sample rate: {} Hz, Target: {} Hz",
            decoded.sample_rate, self.target_sample_rate
        );

        let mut samples = if decoded.sample_rate != self.target_sample_rate {
            resample_mono(&decoded.samples, decoded.sample_rate, self.target_sample_rate)?
        } else {
            decoded.samples
        };

        if self.normalize {
            peak_normalize(&mut samples);
        }

        Waveform::new(samples, self.target_sample_rate)
    }
}

/// Scale samples so the largest magnitude is exactly 1.0
///
/// Signals whose peak is below `f32::MIN_POSITIVE` (digital silence) are
/// left unchanged. Non-finite peaks are left for [`Waveform::new`] to reject.
pub fn peak_normalize(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if !peak.is_finite() || peak < f32::MIN_POSITIVE {
        return;
    }
    for s in samples.iter_mut() {
        *s /= peak;
    }
}
