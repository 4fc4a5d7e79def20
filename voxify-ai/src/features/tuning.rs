//! Tuning deviation estimate from spectral peaks
//!
//! Peaks are picked per frame between 150 Hz and 4 kHz among bins above a
//! tenth of the frame maximum, and refined by parabolic interpolation. The
//! tuning is the most common offset of the stronger half of those peaks
//! from the equal-tempered grid, in fractions of a semitone, `[-0.5, 0.5)`.

use ndarray::Array2;

const PEAK_FMIN_HZ: f64 = 150.0;
const PEAK_FMAX_HZ: f64 = 4000.0;
const PEAK_THRESHOLD: f32 = 0.1;
const BINS_PER_OCTAVE: f64 = 12.0;

/// Histogram resolution of the estimate (fraction of a semitone)
pub const TUNING_RESOLUTION: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Peak {
    freq: f64,
    magnitude: f64,
}

/// Interpolated peaks of every frame of a `(n_fft / 2 + 1, frames)` spectrogram
fn spectral_peaks(spectrum: &Array2<f32>, sample_rate: u32) -> Vec<Peak> {
    let n_bins = spectrum.nrows();
    if n_bins < 3 {
        return Vec::new();
    }
    let bin_hz = sample_rate as f64 / (2 * (n_bins - 1)) as f64;
    let fmax = PEAK_FMAX_HZ.min(sample_rate as f64 / 2.0);

    let mut peaks = Vec::new();
    for frame in spectrum.columns() {
        let reference = PEAK_THRESHOLD * frame.iter().fold(0.0f32, |m, &v| m.max(v));
        let gated = |k: usize| if frame[k] > reference { frame[k] } else { 0.0 };

        for k in 1..n_bins - 1 {
            let freq = k as f64 * bin_hz;
            if freq < PEAK_FMIN_HZ || freq >= fmax {
                continue;
            }
            let here = gated(k);
            if here <= gated(k - 1) || here < gated(k + 1) {
                continue;
            }

            let prev = frame[k - 1] as f64;
            let centre = frame[k] as f64;
            let next = frame[k + 1] as f64;
            let slope = 0.5 * (next - prev);
            let curvature = 2.0 * centre - next - prev;
            let shift = if curvature.abs() < f32::MIN_POSITIVE as f64 {
                slope / (curvature + 1.0)
            } else {
                slope / curvature
            };

            peaks.push(Peak {
                freq: (k as f64 + shift) * bin_hz,
                magnitude: centre + 0.5 * slope * shift,
            });
        }
    }
    peaks
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    match values.len() {
        0 => 0.0,
        n if n % 2 == 0 => 0.5 * (values[mid - 1] + values[mid]),
        _ => values[mid],
    }
}

/// Most common deviation of `frequencies` from A440 equal temperament
///
/// Returns 0 when no frequency is positive.
pub fn pitch_tuning(frequencies: &[f64]) -> f64 {
    let n_bins = (1.0 / TUNING_RESOLUTION).ceil() as usize;
    let mut counts = vec![0usize; n_bins];
    let mut seen = false;

    for &freq in frequencies.iter().filter(|f| **f > 0.0) {
        let mut residual = (BINS_PER_OCTAVE * (freq / (440.0 / 16.0)).log2()).rem_euclid(1.0);
        if residual >= 0.5 {
            residual -= 1.0;
        }
        let bin = ((residual + 0.5) / TUNING_RESOLUTION).floor() as usize;
        counts[bin.min(n_bins - 1)] += 1;
        seen = true;
    }
    if !seen {
        return 0.0;
    }

    let mut best = 0;
    for (i, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = i;
        }
    }
    -0.5 + best as f64 * TUNING_RESOLUTION
}

/// Tuning offset (fraction of a semitone) of a power spectrogram
pub fn estimate_tuning(spectrum: &Array2<f32>, sample_rate: u32) -> f64 {
    let peaks: Vec<Peak> = spectral_peaks(spectrum, sample_rate)
        .into_iter()
        .filter(|p| p.freq > 0.0)
        .collect();
    if peaks.is_empty() {
        return 0.0;
    }

    let threshold = median(peaks.iter().map(|p| p.magnitude).collect());
    let strong: Vec<f64> = peaks
        .iter()
        .filter(|p| p.magnitude >= threshold)
        .map(|p| p.freq)
        .collect();
    pitch_tuning(&strong)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::stft::Stft;
    use std::f32::consts::PI;

    fn tone_power(freq: f32, sr: u32) -> Array2<f32> {
        let samples: Vec<f32> = (0..sr)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sr as f32).sin())
            .collect();
        Stft::new(512, 256).power(&samples)
    }

    #[test]
    fn test_pitch_tuning_histogram() {
        let sharp = 440.0 * 2f64.powf(0.25 / 12.0);
        assert!((pitch_tuning(&[sharp, sharp, 261.63]) - 0.25).abs() < 0.011);

        // 0.6 above A is 0.4 below A#
        let wrapped = 440.0 * 2f64.powf(0.6 / 12.0);
        assert!((pitch_tuning(&[wrapped]) + 0.4).abs() < 0.011);

        assert_eq!(pitch_tuning(&[]), 0.0);
        assert_eq!(pitch_tuning(&[0.0, -3.0]), 0.0);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(vec![4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_estimate_of_bin_centred_tone() {
        // Bin 57 at 8 kHz / 512 is 890.625 Hz, about 0.21 semitone above A5
        let tuning = estimate_tuning(&tone_power(890.625, 8000), 8000);
        assert!((tuning - 0.20).abs() < 0.015, "tuning was {}", tuning);
    }

    #[test]
    fn test_flat_tone_estimates_negative() {
        let tuning = estimate_tuning(&tone_power(437.5, 8000), 8000);
        // 437.5 Hz is bin 28 exactly, 0.1 semitone flat
        assert!((tuning + 0.10).abs() < 0.015, "tuning was {}", tuning);
    }

    #[test]
    fn test_silence_has_zero_tuning() {
        let power = Array2::<f32>::zeros((257, 10));
        assert_eq!(estimate_tuning(&power, 8000), 0.0);
    }
}
