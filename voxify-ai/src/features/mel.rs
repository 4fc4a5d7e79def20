//! Slaney mel scale and filter bank
//!
//! The Slaney mel scale is linear below 1 kHz and logarithmic above:
//!
//! - For freq < 1000 Hz: `mel = 3 × freq / 200`
//! - For freq >= 1000 Hz: `mel = 15 + 27 × ln(freq / 1000) / ln(6.4)`
//!
//! Each triangular filter is area-normalized by `2 / (upper - lower)`.

use ndarray::Array2;

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = 15.0;
const LOGSTEP: f64 = 0.06875177742094912; // ln(6.4) / 27

/// Convert frequency in Hz to mel scale using Slaney formula.
pub fn hz_to_mel(freq: f64) -> f64 {
    if freq < MIN_LOG_HZ {
        freq / F_SP
    } else {
        MIN_LOG_MEL + (freq / MIN_LOG_HZ).ln() / LOGSTEP
    }
}

/// Convert mel scale to frequency in Hz using Slaney formula.
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel < MIN_LOG_MEL {
        mel * F_SP
    } else {
        MIN_LOG_HZ * ((mel - MIN_LOG_MEL) * LOGSTEP).exp()
    }
}

/// Create a Slaney-normalized mel filter bank, shape `(n_mels, n_fft / 2 + 1)`.
///
/// Filters whose band falls between FFT bins come out all-zero; that is
/// expected for narrow low-frequency bands at small `n_fft`.
pub fn mel_filter_bank(
    sample_rate: u32,
    n_fft: usize,
    n_mels: usize,
    f_min: f64,
    f_max: f64,
) -> Array2<f32> {
    let n_freqs = n_fft / 2 + 1;

    let fft_freqs: Vec<f64> = (0..n_freqs)
        .map(|i| i as f64 * sample_rate as f64 / n_fft as f64)
        .collect();

    let mel_min = hz_to_mel(f_min);
    let mel_max = hz_to_mel(f_max);
    let n_points = n_mels + 2;
    let freq_points: Vec<f64> = (0..n_points)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (n_points - 1) as f64))
        .collect();

    let mut filters = Array2::<f32>::zeros((n_mels, n_freqs));

    for m in 0..n_mels {
        let lower = freq_points[m];
        let center = freq_points[m + 1];
        let upper = freq_points[m + 2];
        let enorm = 2.0 / (upper - lower);

        for (k, &freq) in fft_freqs.iter().enumerate() {
            let rising = (freq - lower) / (center - lower);
            let falling = (upper - freq) / (upper - center);
            let weight = rising.min(falling).max(0.0);
            filters[[m, k]] = (weight * enorm) as f32;
        }
    }

    filters
}

/// Project a power spectrogram `(n_freqs, frames)` onto mel bands
pub fn apply_filter_bank(filters: &Array2<f32>, power: &Array2<f32>) -> Array2<f32> {
    filters.dot(power)
}
