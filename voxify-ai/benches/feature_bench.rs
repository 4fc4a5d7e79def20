//! Feature Extraction Benchmark
//!
//! Measures the spectral front end on synthetic recordings at the fusion
//! rate (8 kHz) and the MFCC summary at the gate rate (16 kHz).
//!
//! ## Scenarios
//!
//! - full fusion extraction (mel, MFCC, chroma, tonnetz fallback) for 5 s / 20 s
//! - gate MFCC (20 coefficients) for 5 s
//! - harmonic separation, which dominates tonnetz cost at wideband rates

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::f32::consts::PI;
use voxify_ai::audio::Waveform;
use voxify_ai::classifier::mfcc_summary;
use voxify_ai::features::harmonic::HarmonicSeparator;
use voxify_ai::features::{FeatureExtractor, MfccExtractor, MfccParams, GATE_MFCC};

fn synthetic(seconds: f32, sample_rate: u32) -> Vec<f32> {
    let len = (seconds * sample_rate as f32) as usize;
    let mut state = 0x1234_5678u32;
    (0..len)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let noise = (state as f32 / u32::MAX as f32) * 2.0 - 1.0;
            let t = i as f32 / sample_rate as f32;
            let envelope = (2.0 * PI * 0.3 * t).sin().max(0.0);
            0.5 * envelope * noise + 0.1 * (2.0 * PI * 220.0 * t).sin()
        })
        .collect()
}

fn bench_fusion_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("fusion_extraction");
    let extractor = FeatureExtractor::new(8000);

    for seconds in [5.0f32, 20.0] {
        let waveform = Waveform::new(synthetic(seconds, 8000), 8000).unwrap();
        group.throughput(Throughput::Elements(waveform.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}s", seconds)),
            &waveform,
            |b, waveform| b.iter(|| extractor.extract(black_box(waveform))),
        );
    }

    group.finish();
}

fn bench_gate_features(c: &mut Criterion) {
    let extractor = MfccExtractor::new(16_000, MfccParams::with_coefficients(GATE_MFCC));
    let samples = synthetic(5.0, 16_000);

    c.bench_function("gate_mfcc_summary_5s", |b| {
        b.iter(|| mfcc_summary(&extractor.compute(black_box(&samples))))
    });
}

fn bench_harmonic_separation(c: &mut Criterion) {
    let separator = HarmonicSeparator::new();
    let samples = synthetic(5.0, 16_000);

    c.bench_function("harmonic_separation_5s_16k", |b| {
        b.iter(|| separator.harmonic(black_box(&samples)))
    });
}

criterion_group!(
    benches,
    bench_fusion_extraction,
    bench_gate_features,
    bench_harmonic_separation
);
criterion_main!(benches);
