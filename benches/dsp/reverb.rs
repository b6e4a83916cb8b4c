//! Benchmarks for reverb processing.

use std::hint::black_box;

use chordwave::dsp::reverb::{ReverbConfig, ReverbEngine};
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");

    let sample_rate = 48_000.0;
    let rooms = [
        ("small_room", ReverbConfig::small_room()),
        ("large_hall", ReverbConfig::large_hall()),
        (
            "pre_delayed",
            ReverbConfig {
                pre_delay: Some(0.04),
                ..ReverbConfig::large_hall()
            },
        ),
    ];

    for &size in BLOCK_SIZES {
        // Generate a test signal (impulse-like with some content)
        let input: Vec<f32> = (0..size)
            .map(|i| {
                if i < 10 {
                    1.0 - (i as f32 / 10.0) // Initial impulse
                } else {
                    (i as f32 * 0.05).sin() * 0.1 // Quiet tail
                }
            })
            .collect();

        for (name, config) in &rooms {
            let mut reverb = ReverbEngine::new(config, sample_rate).expect("valid reverb");
            group.bench_with_input(BenchmarkId::new(*name, size), &size, |b, _| {
                b.iter(|| {
                    let mut sum = 0.0f32;
                    for &sample in &input {
                        sum += reverb.process(black_box(sample));
                    }
                    sum
                })
            });
        }
    }

    group.finish();
}
