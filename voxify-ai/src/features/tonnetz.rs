//! Tonal centroid features
//!
//! The harmonic component of the signal is reduced to a pitch-class profile
//! (84 semitone bands from C1, folded onto 12 classes, L1-normalized per
//! frame) and projected onto three circles: fifths, minor thirds and major
//! thirds. Each circle contributes a sine and a cosine row.

use super::harmonic::HarmonicSeparator;
use super::stft::Stft;
use super::{ExtractionDegenerate, CHROMA_BINS, TONNETZ_DIMS};
use ndarray::Array2;
use std::f64::consts::PI;

/// Lowest semitone band centre (C1)
pub const C1_HZ: f64 = 32.703_195_662_574_83;
/// Semitone bands analysed (7 octaves)
pub const SEMITONE_BANDS: usize = 84;

const TONNETZ_N_FFT: usize = 2048;

/// Upper edge of the highest semitone band (half a semitone above B7)
pub fn top_band_edge_hz() -> f64 {
    band_centre_hz(SEMITONE_BANDS - 1) * 2f64.powf(1.0 / 24.0)
}

fn band_centre_hz(band: usize) -> f64 {
    C1_HZ * 2f64.powf(band as f64 / 12.0)
}

/// Tonal centroid projection, shape `(6, 12)`
pub fn tonal_centroid_basis() -> Array2<f32> {
    // (interval in pitch-class steps as a fraction of a turn, radius)
    const CIRCLES: [(f64, f64); 3] = [(7.0 / 6.0, 1.0), (3.0 / 2.0, 1.0), (2.0 / 3.0, 0.5)];

    Array2::from_shape_fn((TONNETZ_DIMS, CHROMA_BINS), |(row, pc)| {
        let (interval, radius) = CIRCLES[row / 2];
        let angle = PI * interval * pc as f64;
        let value = if row % 2 == 0 { angle.sin() } else { angle.cos() };
        (radius * value) as f32
    })
}

/// Semitone band weights over STFT bins, shape `(84, n_fft / 2 + 1)`
fn semitone_bank(sample_rate: u32, n_fft: usize) -> Array2<f32> {
    let bin_hz = sample_rate as f64 / n_fft as f64;
    let half_step = 2f64.powf(1.0 / 24.0);

    Array2::from_shape_fn((SEMITONE_BANDS, n_fft / 2 + 1), |(band, k)| {
        let centre = band_centre_hz(band);
        let freq = k as f64 * bin_hz;
        if freq >= centre / half_step && freq < centre * half_step {
            1.0
        } else {
            0.0
        }
    })
}

/// Computes the `(6, frames)` tonnetz of a signal
#[derive(Debug)]
pub struct TonnetzExtractor {
    sample_rate: u32,
    separator: HarmonicSeparator,
    stft: Stft,
    bands: Array2<f32>,
    basis: Array2<f32>,
}

impl TonnetzExtractor {
    /// `hop` sets the frame rate and must match the chromagram's
    pub fn new(sample_rate: u32, hop: usize) -> Self {
        Self {
            sample_rate,
            separator: HarmonicSeparator::new(),
            stft: Stft::new(TONNETZ_N_FFT, hop),
            bands: semitone_bank(sample_rate, TONNETZ_N_FFT),
            basis: tonal_centroid_basis(),
        }
    }

    pub fn compute(&self, samples: &[f32]) -> Result<Array2<f32>, ExtractionDegenerate> {
        if samples.is_empty() {
            return Err(ExtractionDegenerate::EmptySignal);
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(ExtractionDegenerate::NonFiniteSamples);
        }

        let nyquist_hz = self.sample_rate as f64 / 2.0;
        let upper_hz = top_band_edge_hz();
        if upper_hz > nyquist_hz {
            return Err(ExtractionDegenerate::AboveNyquist {
                upper_hz,
                nyquist_hz,
            });
        }

        let harmonic = self.separator.harmonic(samples)?;
        let semitones = self.bands.dot(&self.stft.power(&harmonic));

        let mut pitch_classes = Array2::<f32>::zeros((CHROMA_BINS, semitones.ncols()));
        for (band, row) in semitones.rows().into_iter().enumerate() {
            let mut target = pitch_classes.row_mut(band % CHROMA_BINS);
            target += &row;
        }

        for mut frame in pitch_classes.columns_mut() {
            let total: f32 = frame.iter().map(|v| v.abs()).sum();
            if total >= f32::MIN_POSITIVE {
                frame.mapv_inplace(|v| v / total);
            }
        }

        let tonnetz = self.basis.dot(&pitch_classes);
        if tonnetz.iter().any(|v| !v.is_finite()) {
            return Err(ExtractionDegenerate::HarmonicDecomposition(
                "pitch-class profile overflowed".to_string(),
            ));
        }
        Ok(tonnetz)
    }
}
