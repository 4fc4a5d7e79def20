//! Chromagram from a power spectrogram
//!
//! Each FFT bin is spread over the 12 pitch classes with a Gaussian bump
//! centred on its (fractional) pitch class. Columns of the filter bank are
//! L2-normalized, weighted by a Gaussian over octaves centred on octave 5
//! (half-width 2 octaves), and rotated so that row 0 is C. The reference
//! pitch is shifted by the tuning estimated from the spectrogram itself.

use super::tuning::estimate_tuning;
use super::{ExtractionDegenerate, CHROMA_BINS};
use ndarray::Array2;
use tracing::trace;

const CENTER_OCTAVE: f64 = 5.0;
const OCTAVE_WIDTH: f64 = 2.0;

/// Octaves above `A440 / 16`, with A shifted by `tuning` semitones
fn hz_to_octs(freq: f64, tuning: f64) -> f64 {
    let a440 = 440.0 * 2f64.powf(tuning / CHROMA_BINS as f64);
    (freq / (a440 / 16.0)).log2()
}

/// Chroma filter bank, shape `(12, n_fft / 2 + 1)`
///
/// `tuning` is the deviation from A440 in fractions of a semitone.
pub fn chroma_filter_bank(sample_rate: u32, n_fft: usize, tuning: f64) -> Array2<f32> {
    let n_chroma = CHROMA_BINS as f64;
    let half_chroma = (n_chroma / 2.0).round();

    // Fractional chroma bin of every FFT bin; bin 0 (DC) is placed 1.5
    // octaves below bin 1
    let mut frqbins: Vec<f64> = (1..n_fft)
        .map(|i| n_chroma * hz_to_octs(i as f64 * sample_rate as f64 / n_fft as f64, tuning))
        .collect();
    frqbins.insert(0, frqbins[0] - 1.5 * n_chroma);

    let mut widths: Vec<f64> = frqbins.windows(2).map(|w| (w[1] - w[0]).max(1.0)).collect();
    widths.push(1.0);

    let mut weights = Array2::<f64>::zeros((CHROMA_BINS, n_fft));
    for (c, mut row) in weights.rows_mut().into_iter().enumerate() {
        for (k, w) in row.iter_mut().enumerate() {
            let d = (frqbins[k] - c as f64 + half_chroma + 10.0 * n_chroma).rem_euclid(n_chroma)
                - half_chroma;
            *w = (-0.5 * (2.0 * d / widths[k]).powi(2)).exp();
        }
    }

    for (k, mut column) in weights.columns_mut().into_iter().enumerate() {
        let norm = column.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm >= f64::MIN_POSITIVE {
            column.mapv_inplace(|w| w / norm);
        }
        let octave = frqbins[k] / n_chroma;
        let octave_weight = (-0.5 * ((octave - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp();
        column.mapv_inplace(|w| w * octave_weight);
    }

    // Rotate so that the first row is C instead of A
    let n_freqs = n_fft / 2 + 1;
    Array2::from_shape_fn((CHROMA_BINS, n_freqs), |(c, k)| {
        weights[[(c + 3) % CHROMA_BINS, k]] as f32
    })
}

/// Chroma features over a tuning-adjusted filter bank
#[derive(Debug, Clone)]
pub struct ChromaExtractor {
    sample_rate: u32,
    n_fft: usize,
    /// Bank for A440; rebuilt per call when the input is detuned
    in_tune: Array2<f32>,
}

impl ChromaExtractor {
    pub fn new(sample_rate: u32, n_fft: usize) -> Self {
        Self {
            sample_rate,
            n_fft,
            in_tune: chroma_filter_bank(sample_rate, n_fft, 0.0),
        }
    }

    /// Chromagram `(12, frames)` with every frame scaled to a peak of 1
    ///
    /// Silent frames stay all-zero.
    pub fn compute(&self, power: &Array2<f32>) -> Result<Array2<f32>, ExtractionDegenerate> {
        if power.iter().any(|p| !p.is_finite()) {
            return Err(ExtractionDegenerate::NonFiniteSamples);
        }

        let tuning = estimate_tuning(power, self.sample_rate);
        trace!(tuning, "Chroma tuning estimate");
        let mut chroma = if tuning == 0.0 {
            self.in_tune.dot(power)
        } else {
            chroma_filter_bank(self.sample_rate, self.n_fft, tuning).dot(power)
        };

        normalize_frames(&mut chroma);
        Ok(chroma)
    }
}

/// Scale every frame to a peak of 1, leaving silent frames at zero
fn normalize_frames(chroma: &mut Array2<f32>) {
    for mut frame in chroma.columns_mut() {
        let peak = frame.iter().fold(0.0f32, |m, v| m.max(v.abs()));
        if peak >= f32::MIN_POSITIVE {
            frame.mapv_inplace(|v| v / peak);
        }
    }
}
