//! Short-time Fourier transform
//!
//! Centered frames (the signal is zero-padded by `n_fft / 2` on both sides),
//! periodic Hann window, one-sided spectrum of `n_fft / 2 + 1` bins. A signal
//! of `len` samples yields `1 + len / hop` frames.

use ndarray::Array2;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Planned forward/inverse transform for one `(n_fft, hop)` pair
pub struct Stft {
    n_fft: usize,
    hop: usize,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl std::fmt::Debug for Stft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stft")
            .field("n_fft", &self.n_fft)
            .field("hop", &self.hop)
            .finish()
    }
}

impl Stft {
    pub fn new(n_fft: usize, hop: usize) -> Self {
        debug_assert!(n_fft >= 2 && n_fft % 2 == 0, "n_fft must be even");
        debug_assert!(hop > 0, "hop must be positive");

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(n_fft);
        let inverse = planner.plan_fft_inverse(n_fft);

        Self {
            n_fft,
            hop,
            window: hann_window(n_fft),
            forward,
            inverse,
        }
    }

    /// Number of one-sided frequency bins
    pub fn n_freqs(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Number of frames produced for a signal of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        1 + len / self.hop
    }

    /// Complex spectrum, shape `(n_freqs, frames)`
    pub fn complex(&self, samples: &[f32]) -> Array2<Complex<f32>> {
        let n_frames = self.frame_count(samples.len());
        let n_freqs = self.n_freqs();
        let half = self.n_fft / 2;

        let mut spectrum = Array2::<Complex<f32>>::zeros((n_freqs, n_frames));
        let mut buffer = vec![Complex::new(0.0f32, 0.0f32); self.n_fft];
        let mut scratch =
            vec![Complex::new(0.0f32, 0.0f32); self.forward.get_inplace_scratch_len()];

        for frame_idx in 0..n_frames {
            // Frame start in unpadded coordinates (may be negative)
            let start = (frame_idx * self.hop) as isize - half as isize;

            for (i, slot) in buffer.iter_mut().enumerate() {
                let src = start + i as isize;
                let sample = if src >= 0 && (src as usize) < samples.len() {
                    samples[src as usize]
                } else {
                    0.0
                };
                *slot = Complex::new(sample * self.window[i], 0.0);
            }

            self.forward.process_with_scratch(&mut buffer, &mut scratch);

            for (k, c) in buffer.iter().take(n_freqs).enumerate() {
                spectrum[[k, frame_idx]] = *c;
            }
        }

        spectrum
    }

    /// Power spectrogram `|X|^2`, shape `(n_freqs, frames)`
    pub fn power(&self, samples: &[f32]) -> Array2<f32> {
        self.complex(samples).mapv(|c| c.norm_sqr())
    }

    /// Inverse transform by weighted overlap-add
    ///
    /// Each frame is windowed again after the inverse FFT and the sum is
    /// divided by the accumulated squared window, then the centre padding is
    /// removed and the result is cut or zero-extended to `length` samples.
    pub fn inverse(&self, spectrum: &Array2<Complex<f32>>, length: usize) -> Vec<f32> {
        let n_freqs = self.n_freqs();
        let n_frames = spectrum.ncols();
        let half = self.n_fft / 2;
        let padded_len = self.n_fft + self.hop * n_frames.saturating_sub(1);

        let mut output = vec![0.0f32; padded_len];
        let mut window_sum = vec![0.0f32; padded_len];
        let mut buffer = vec![Complex::new(0.0f32, 0.0f32); self.n_fft];
        let mut scratch =
            vec![Complex::new(0.0f32, 0.0f32); self.inverse.get_inplace_scratch_len()];
        let scale = 1.0 / self.n_fft as f32;

        for frame_idx in 0..n_frames {
            // Rebuild the full Hermitian spectrum
            for k in 0..n_freqs {
                let c = spectrum[[k, frame_idx]];
                buffer[k] = c;
                if k > 0 && k < self.n_fft - k {
                    buffer[self.n_fft - k] = c.conj();
                }
            }
            // DC and Nyquist bins of a real signal are real
            buffer[0].im = 0.0;
            buffer[half].im = 0.0;

            self.inverse.process_with_scratch(&mut buffer, &mut scratch);

            let offset = frame_idx * self.hop;
            for (i, c) in buffer.iter().enumerate() {
                let w = self.window[i];
                output[offset + i] += c.re * scale * w;
                window_sum[offset + i] += w * w;
            }
        }

        for (y, &wss) in output.iter_mut().zip(window_sum.iter()) {
            if wss > f32::MIN_POSITIVE {
                *y /= wss;
            }
        }

        let mut signal: Vec<f32> = output.into_iter().skip(half).take(length).collect();
        signal.resize(length, 0.0);
        signal
    }
}

/// Periodic Hann window: `0.5 * (1 - cos(2*pi*i/N))`
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_frame_count_matches_centered_framing() {
        let stft = Stft::new(512, 256);
        assert_eq!(stft.frame_count(40_000), 157);
        assert_eq!(stft.frame_count(1), 1);

        let power = stft.power(&vec![0.0; 40_000]);
        assert_eq!(power.dim(), (257, 157));
    }

    #[test]
    fn test_silence_has_zero_power() {
        let stft = Stft::new(512, 256);
        let power = stft.power(&vec![0.0; 4000]);
        assert!(power.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_edges_are_zero_padded() {
        // The first frame sees only the right half of the window over a DC
        // signal, so its DC magnitude is about half that of an interior frame
        let power = Stft::new(512, 256).power(&vec![1.0; 4096]);
        let ratio = power[[0, 0]] / power[[0, 8]];
        assert!((ratio - 0.25).abs() < 0.01, "edge/interior DC power {}", ratio);
    }

    #[test]
    fn test_sine_peaks_at_expected_bin() {
        let sr = 8000;
        let stft = Stft::new(512, 256);
        // 1000 Hz sits exactly on bin 64 (8000 / 512 = 15.625 Hz per bin)
        let power = stft.power(&sine(1000.0, sr, 8000));
        let frame = power.column(10);
        let (peak_bin, _) = frame
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) });
        assert_eq!(peak_bin, 64);
    }

    #[test]
    fn test_inverse_reconstructs_signal() {
        let stft = Stft::new(512, 128);
        let signal = sine(440.0, 16_000, 4000);
        let spectrum = stft.complex(&signal);
        let rebuilt = stft.inverse(&spectrum, signal.len());

        assert_eq!(rebuilt.len(), signal.len());
        let max_err = signal
            .iter()
            .zip(&rebuilt)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_err < 1e-3, "max reconstruction error {}", max_err);
    }

    #[test]
    fn test_hann_window_is_periodic() {
        let w = hann_window(8);
        assert_eq!(w[0], 0.0);
        assert!((w[4] - 1.0).abs() < 1e-6);
        assert!((w[2] - w[6]).abs() < 1e-6);
    }
}
