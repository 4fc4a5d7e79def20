//! Mel-frequency cepstral coefficients
//!
//! MFCCs are computed straight from the waveform with their own analysis
//! parameters (2048-point STFT, hop 512, 128 mel bands over `[0, sr/2]`),
//! independent of the bounded mel spectrogram used by the spectral stack.
//! Pipeline: power spectrogram → mel bands → decibels (`ref = 1`,
//! `amin = 1e-10`, 80 dB dynamic range) → orthonormal DCT-II.

use super::mel::{apply_filter_bank, mel_filter_bank};
use super::stft::Stft;
use ndarray::Array2;

/// MFCC analysis parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MfccParams {
    pub n_mfcc: usize,
    pub n_mels: usize,
    pub n_fft: usize,
    pub hop: usize,
}

impl MfccParams {
    pub fn with_coefficients(n_mfcc: usize) -> Self {
        Self {
            n_mfcc,
            ..Self::default()
        }
    }
}

impl Default for MfccParams {
    fn default() -> Self {
        Self {
            n_mfcc: 20,
            n_mels: 128,
            n_fft: 2048,
            hop: 512,
        }
    }
}

const AMIN: f32 = 1e-10;
const TOP_DB: f32 = 80.0;

/// MFCC extractor with precomputed transform, filter bank and DCT basis
#[derive(Debug)]
pub struct MfccExtractor {
    params: MfccParams,
    stft: Stft,
    mel_filters: Array2<f32>,
    dct: Array2<f32>,
}

impl MfccExtractor {
    pub fn new(sample_rate: u32, params: MfccParams) -> Self {
        let stft = Stft::new(params.n_fft, params.hop);
        let mel_filters = mel_filter_bank(
            sample_rate,
            params.n_fft,
            params.n_mels,
            0.0,
            sample_rate as f64 / 2.0,
        );
        let dct = dct_ortho_basis(params.n_mfcc, params.n_mels);

        Self {
            params,
            stft,
            mel_filters,
            dct,
        }
    }

    pub fn params(&self) -> &MfccParams {
        &self.params
    }

    /// Frames produced for a signal of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        self.stft.frame_count(len)
    }

    /// MFCC matrix, shape `(n_mfcc, frames)`
    pub fn compute(&self, samples: &[f32]) -> Array2<f32> {
        let power = self.stft.power(samples);
        let mel = apply_filter_bank(&self.mel_filters, &power);
        let mel_db = power_to_db(&mel);
        self.dct.dot(&mel_db)
    }
}

/// Convert power to decibels relative to 1.0, clamped to 80 dB below the peak
pub fn power_to_db(power: &Array2<f32>) -> Array2<f32> {
    let mut db = power.mapv(|p| 10.0 * p.max(AMIN).log10());
    let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if peak.is_finite() {
        let floor = peak - TOP_DB;
        db.mapv_inplace(|v| v.max(floor));
    }
    db
}

/// Orthonormal DCT-II basis, shape `(n_out, n_in)`; row `k` is
/// `s_k * cos(pi * k * (2n + 1) / (2 * n_in))`.
pub fn dct_ortho_basis(n_out: usize, n_in: usize) -> Array2<f32> {
    let n = n_in as f64;
    Array2::from_shape_fn((n_out, n_in), |(k, i)| {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        let angle = std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n);
        (scale * angle.cos()) as f32
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape() {
        let extractor = MfccExtractor::new(8000, MfccParams::with_coefficients(40));
        let mfcc = extractor.compute(&vec![0.0; 40_000]);
        assert_eq!(mfcc.dim(), (40, 79)); // 1 + 40000 / 512
        assert_eq!(extractor.frame_count(40_000), 79);
    }

    #[test]
    fn test_silence_is_flat() {
        let extractor = MfccExtractor::new(16_000, MfccParams::default());
        let mfcc = extractor.compute(&vec![0.0; 16_000]);

        // Every mel band sits at -100 dB, so only c0 is non-zero
        let expected_c0 = -100.0 * (128.0f32).sqrt();
        for frame in mfcc.columns() {
            assert!((frame[0] - expected_c0).abs() < 1e-2, "c0 = {}", frame[0]);
            for &c in frame.iter().skip(1) {
                assert!(c.abs() < 1e-2);
            }
        }
    }

    #[test]
    fn test_power_to_db_clamps_dynamic_range() {
        let power = Array2::from_shape_vec((1, 3), vec![1.0, 1e-3, 0.0]).unwrap();
        let db = power_to_db(&power);
        assert!((db[[0, 0]] - 0.0).abs() < 1e-5);
        assert!((db[[0, 1]] + 30.0).abs() < 1e-4);
        assert!((db[[0, 2]] + 80.0).abs() < 1e-5);
    }

    #[test]
    fn test_dct_basis_is_orthonormal() {
        let basis = dct_ortho_basis(128, 128);
        let gram = basis.dot(&basis.t());
        for i in 0..128 {
            for j in 0..128 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((gram[[i, j]] - expected).abs() < 1e-4);
            }
        }
    }
}
