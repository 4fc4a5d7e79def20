//! Harmonic/percussive separation by median filtering
//!
//! The magnitude spectrogram is median-filtered along time (harmonic
//! estimate) and along frequency (percussive estimate). A soft mask built
//! from the two estimates is applied to the complex spectrum, which is then
//! inverted back to a signal of the original length.

use super::stft::Stft;
use super::ExtractionDegenerate;
use ndarray::{Array2, Axis};

const HPSS_N_FFT: usize = 2048;
const HPSS_HOP: usize = 512;
const KERNEL: usize = 31;
const MASK_POWER: i32 = 2;

/// Extracts the harmonic component of a signal
#[derive(Debug)]
pub struct HarmonicSeparator {
    stft: Stft,
    kernel: usize,
}

impl Default for HarmonicSeparator {
    fn default() -> Self {
        Self::new()
    }
}

impl HarmonicSeparator {
    pub fn new() -> Self {
        Self {
            stft: Stft::new(HPSS_N_FFT, HPSS_HOP),
            kernel: KERNEL,
        }
    }

    pub fn harmonic(&self, samples: &[f32]) -> Result<Vec<f32>, ExtractionDegenerate> {
        let mut spectrum = self.stft.complex(samples);
        let magnitude = spectrum.mapv(|c| c.norm());

        let harmonic = median_filter(&magnitude, Axis(1), self.kernel);
        let percussive = median_filter(&magnitude, Axis(0), self.kernel);

        ndarray::Zip::from(&mut spectrum)
            .and(&harmonic)
            .and(&percussive)
            .for_each(|c, &h, &p| *c *= soft_mask(h, p));

        let signal = self.stft.inverse(&spectrum, samples.len());
        if signal.iter().any(|s| !s.is_finite()) {
            return Err(ExtractionDegenerate::HarmonicDecomposition(
                "inverse transform produced non-finite samples".to_string(),
            ));
        }
        Ok(signal)
    }
}

/// Wiener-style soft mask `h^2 / (h^2 + p^2)`, 0.5 when both are zero
fn soft_mask(harmonic: f32, percussive: f32) -> f32 {
    let z = harmonic.max(percussive);
    if z < f32::MIN_POSITIVE {
        return 0.5;
    }
    let h = (harmonic / z).powi(MASK_POWER);
    let p = (percussive / z).powi(MASK_POWER);
    h / (h + p)
}

/// Median filter of odd width `size` along `axis`, edges mirrored
/// (`d c b a | a b c d | d c b a`)
pub fn median_filter(data: &Array2<f32>, axis: Axis, size: usize) -> Array2<f32> {
    let half = (size / 2) as isize;
    let mut output = Array2::<f32>::zeros(data.raw_dim());
    let mut window = Vec::with_capacity(size);

    for (lane_in, mut lane_out) in data.lanes(axis).into_iter().zip(output.lanes_mut(axis)) {
        let n = lane_in.len();
        for (i, out) in lane_out.iter_mut().enumerate() {
            window.clear();
            for offset in -half..=half {
                window.push(lane_in[reflect_index(i as isize + offset, n)]);
            }
            let mid = window.len() / 2;
            let (_, median, _) = window.select_nth_unstable_by(mid, f32::total_cmp);
            *out = *median;
        }
    }

    output
}

fn reflect_index(index: isize, len: usize) -> usize {
    let period = 2 * len as isize;
    let folded = index.rem_euclid(period);
    if folded >= len as isize {
        (period - 1 - folded) as usize
    } else {
        folded as usize
    }
}
