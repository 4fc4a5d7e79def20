//! Safe spectral analysis bounds for a sample rate

/// Lower analysis bound (Hz)
pub const FMIN_HZ: f32 = 20.0;
/// Upper analysis bound cap (Hz)
pub const FMAX_CAP_HZ: f32 = 3900.0;
/// Guard distance kept below Nyquist and minimum band width (Hz)
pub const GUARD_HZ: f32 = 10.0;

/// Frequency range (Hz) the mel filter bank spans
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBounds {
    pub fmin: f32,
    pub fmax: f32,
}

impl FrequencyBounds {
    /// `fmin` is fixed at 20 Hz and `fmax = min(nyquist - 10, 3900)`.
    ///
    /// At very low sample rates the band is widened to `fmin + 10` so the
    /// filter bank always has at least 10 Hz to work with.
    pub fn for_sample_rate(sample_rate: u32) -> Self {
        let nyquist = sample_rate as f32 / 2.0;
        let fmin = FMIN_HZ;
        let mut fmax = (nyquist - GUARD_HZ).min(FMAX_CAP_HZ);
        if fmax <= fmin + GUARD_HZ {
            fmax = fmin + GUARD_HZ;
        }
        Self { fmin, fmax }
    }

    pub fn width(&self) -> f32 {
        self.fmax - self.fmin
    }
}
