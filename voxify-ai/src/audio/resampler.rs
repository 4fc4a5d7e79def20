//! Audio resampling using rubato
//!
//! Converts decoded mono audio to the sample rate a pipeline path expects
//! (8000 Hz for the fusion classifier, 16000 Hz for the gate). A windowed
//! sinc interpolator band-limits the signal below the lower of the two
//! Nyquist frequencies, so downsampling does not fold high content back
//! into the band.

use crate::error::DecodeError;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Input frames fed to rubato per call
const CHUNK_SIZE: usize = 4096;

fn create_sinc_resampler(
    input_rate: u32,
    output_rate: u32,
    chunk_size: usize,
) -> Result<SincFixedIn<f32>, DecodeError> {
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    SincFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0,
        params,
        chunk_size,
        1,
    )
    .map_err(|e| DecodeError::Resample(format!("Failed to create sinc resampler: {}", e)))
}

/// Resample mono audio from `input_rate` to `output_rate`.
///
/// The output always holds `ceil(len * output_rate / input_rate)` samples,
/// aligned with the input: the filter delay is skipped and the tail is
/// flushed out of the resampler, then trimmed or zero-extended to that
/// length so the frame count downstream depends only on input length and
/// rates.
///
/// If the rates already match, returns a copy without resampling.
pub fn resample_mono(
    input: &[f32],
    input_rate: u32,
    output_rate: u32,
) -> Result<Vec<f32>, DecodeError> {
    if input_rate == 0 {
        return Err(DecodeError::InvalidSampleRate(input_rate));
    }
    if output_rate == 0 {
        return Err(DecodeError::InvalidSampleRate(output_rate));
    }

    if input_rate == output_rate || input.is_empty() {
        debug!("Sample rate already at {}Hz, skipping resample", output_rate);
        return Ok(input.to_vec());
    }

    debug!("Resampling from {}Hz to {}Hz", input_rate, output_rate);

    let expected_len = expected_output_len(input.len(), input_rate, output_rate);
    let chunk_size = CHUNK_SIZE.min(input.len());
    let mut resampler = create_sinc_resampler(input_rate, output_rate, chunk_size)?;
    let delay = resampler.output_delay();
    let wanted = delay + expected_len;
    let resample_error = |e: rubato::ResampleError| DecodeError::Resample(e.to_string());

    let mut output = Vec::with_capacity(wanted + CHUNK_SIZE);
    let mut pos = 0;
    while pos + resampler.input_frames_next() <= input.len() {
        let frames = resampler.input_frames_next();
        let chunk = resampler
            .process(&[&input[pos..pos + frames]], None)
            .map_err(resample_error)?;
        output.extend_from_slice(&chunk[0]);
        pos += frames;
    }
    if pos < input.len() {
        let chunk = resampler
            .process_partial(Some(&[&input[pos..]]), None)
            .map_err(resample_error)?;
        output.extend_from_slice(&chunk[0]);
    }

    // Flush the samples still held in the filter
    while output.len() < wanted {
        let chunk = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(resample_error)?;
        if chunk[0].is_empty() {
            break;
        }
        output.extend_from_slice(&chunk[0]);
    }

    let mut output: Vec<f32> = output.into_iter().skip(delay).take(expected_len).collect();
    output.resize(expected_len, 0.0);

    debug!(
        "Resampled {} input samples to {} output samples",
        input.len(),
        output.len()
    );

    Ok(output)
}

/// Output length for a resample of `len` samples: `ceil(len * out / in)`
pub fn expected_output_len(len: usize, input_rate: u32, output_rate: u32) -> usize {
    let numerator = len as u64 * output_rate as u64;
    numerator.div_ceil(input_rate as u64) as usize
}
