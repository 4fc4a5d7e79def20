//! Audio Test Fixture Generator
//!
//! Writes 16-bit PCM WAV files with hound

use std::f32::consts::PI;
use std::path::{Path, PathBuf};

/// Waveform written into the fixture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    /// Digital silence
    Silence,
    /// Steady sine tone
    Tone { freq: f32, amplitude: f32 },
    /// Noise bursts shaped like breathing cycles
    Breathing { cycles_per_second: f32, amplitude: f32 },
}

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub signal: Signal,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 5.0,
            sample_rate: 8000,
            channels: 1,
            signal: Signal::Silence,
        }
    }
}

/// Deterministic white noise in [-1, 1]
struct XorShift(u32);

impl XorShift {
    fn next(&mut self) -> f32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        (self.0 as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

/// Generate a test WAV file with specified configuration
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;
    let mut noise = XorShift(0x9e37_79b9);

    for i in 0..total_samples {
        let t = i as f32 / config.sample_rate as f32;
        let value = match config.signal {
            Signal::Silence => 0.0,
            Signal::Tone { freq, amplitude } => amplitude * (2.0 * PI * freq * t).sin(),
            Signal::Breathing {
                cycles_per_second,
                amplitude,
            } => {
                // Half of each cycle is airflow, the other half is a pause
                let envelope = (2.0 * PI * cycles_per_second * t).sin().max(0.0).powi(2);
                amplitude * envelope * noise.next()
            }
        };
        let sample = (value * i16::MAX as f32) as i16;

        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Breathing-like fixture at 16 kHz
pub fn generate_breathing_wav(path: &Path, duration_seconds: f64) -> anyhow::Result<PathBuf> {
    generate_test_wav(
        path,
        &AudioConfig {
            duration_seconds,
            sample_rate: 16_000,
            channels: 1,
            signal: Signal::Breathing {
                cycles_per_second: 0.5,
                amplitude: 0.5,
            },
        },
    )
}
