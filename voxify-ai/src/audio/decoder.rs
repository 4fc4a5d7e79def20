//! Audio Decoding Utilities
//!
//! Decode audio files to mono f32 PCM samples at their native sample rate.
//!
//! Uses symphonia for format-agnostic decoding (WAV, FLAC, MP3, OGG, AAC, etc.)

use crate::error::DecodeError;
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded audio result
#[derive(Debug)]
pub struct DecodedAudio {
    /// Mono audio samples (f32, range [-1.0, 1.0])
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

/// Decode audio file to mono f32 PCM samples
///
/// **Algorithm:**
/// 1. Open file and probe format using symphonia
/// 2. Find default audio track
/// 3. Create decoder for track codec
/// 4. Decode all packets, averaging channels to mono
///
/// An empty result is returned as-is; rejecting it is the loader's job.
///
/// # Errors
/// * [`DecodeError::Open`] for file I/O errors
/// * [`DecodeError::Probe`] for unrecognised containers (e.g. a text file)
/// * [`DecodeError::Decode`] for corrupt audio data
pub fn decode_audio_file(file_path: &Path) -> Result<DecodedAudio, DecodeError> {
    tracing::debug!(path = %file_path.display(), "Decoding audio file");

    let file = std::fs::File::open(file_path).map_err(|source| DecodeError::Open {
        path: file_path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Create format hint from file extension
    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DecodeError::Probe {
            path: file_path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::NoAudioTrack(file_path.to_path_buf()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DecodeError::MissingSampleRate(file_path.to_path_buf()))?;
    let channel_count = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);

    tracing::debug!(
        path = %file_path.display(),
        sample_rate = sample_rate,
        channels = channel_count,
        "Audio file info"
    );

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Decode {
            path: file_path.to_path_buf(),
            reason: format!("failed to create decoder: {}", e),
        })?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // End of stream
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(DecodeError::Decode {
                    path: file_path.to_path_buf(),
                    reason: format!("error reading packet: {}", e),
                });
            }
        };

        // Skip packets from other tracks
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet).map_err(|e| DecodeError::Decode {
            path: file_path.to_path_buf(),
            reason: e.to_string(),
        })?;

        mix_to_mono(&decoded, &mut all_samples);
    }

    tracing::debug!(
        path = %file_path.display(),
        total_samples = all_samples.len(),
        duration_seconds = format!("{:.2}", all_samples.len() as f64 / sample_rate as f64),
        "Audio decoding complete"
    );

    Ok(DecodedAudio {
        samples: all_samples,
        sample_rate,
    })
}

/// Convert a decoded buffer of any sample format to f32 and append the
/// channel average of each frame to `out`.
fn mix_to_mono(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
    let spec = *decoded.spec();
    let mut buf = AudioBuffer::<f32>::new(decoded.capacity() as u64, spec);
    decoded.convert(&mut buf);

    let num_channels = buf.spec().channels.count();
    let num_frames = buf.frames();
    if num_channels == 0 {
        return;
    }

    out.reserve(num_frames);
    if num_channels == 1 {
        out.extend_from_slice(&buf.chan(0)[..num_frames]);
        return;
    }

    let scale = 1.0 / num_channels as f32;
    for frame_idx in 0..num_frames {
        let sum: f32 = (0..num_channels).map(|ch| buf.chan(ch)[frame_idx]).sum();
        out.push(sum * scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_audio_file_not_found() {
        let result = decode_audio_file(Path::new("/nonexistent/file.wav"));
        assert!(matches!(result, Err(DecodeError::Open { .. })));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to open audio file"));
    }

    // Decoding of real files is covered by the integration tests, which
    // generate WAV fixtures with hound.
}
