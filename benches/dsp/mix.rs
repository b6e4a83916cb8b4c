//! Benchmarks for mix-bus helpers.

use std::hint::black_box;

use chordwave::dsp::mix;
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/mix");

    for &size in BLOCK_SIZES {
        let signal_a: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();
        let signal_b: Vec<f32> = (0..size).map(|i| (i as f32 * 0.15).cos()).collect();

        // Voice summing at an offset with velocity gain
        let mut bus = vec![0.0f32; size * 2];
        group.bench_with_input(BenchmarkId::new("sum_into", size), &size, |b, _| {
            b.iter(|| {
                mix::sum_into(black_box(&mut bus), black_box(&signal_b), size / 2, 0.8);
            })
        });

        let mut buffer = signal_a.clone();
        group.bench_with_input(BenchmarkId::new("sum_in_place", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&signal_a);
                mix::sum_in_place(black_box(&mut buffer), black_box(&signal_b));
            })
        });

        // The final mastering pass
        let mut buffer = signal_a.clone();
        group.bench_with_input(BenchmarkId::new("master", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&signal_a);
                mix::sum_in_place(&mut buffer, &signal_b);
                mix::scale_in_place(&mut buffer, 0.8);
                mix::normalize_above(black_box(&mut buffer), 1.0);
                mix::clamp_in_place(&mut buffer);
            })
        });
    }

    group.finish();
}
