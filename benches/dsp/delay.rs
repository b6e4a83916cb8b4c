//! Benchmarks for delay line operations.

use std::hint::black_box;

use chordwave::dsp::delay::DelayLine;
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // Delay times in samples
    let delay_times: &[f32] = &[
        480.0,   // 10ms at 48kHz
        4800.0,  // 100ms at 48kHz
        48000.0, // 1 second at 48kHz
    ];

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        for &delay_samples in delay_times {
            let delay_ms = delay_samples / 48.0;
            let mut delay = DelayLine::with_duration(2.0, 48_000.0);
            let mut buffer = input.clone();
            group.bench_with_input(
                BenchmarkId::new(format!("render_{}ms", delay_ms as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.copy_from_slice(&input);
                        delay.render(black_box(&mut buffer), black_box(delay_samples));
                    })
                },
            );
        }

        // Fractional taps, as the reverb reads them
        let mut delay = DelayLine::with_duration(1.0, 48_000.0);
        for &sample in &input {
            delay.push(sample);
        }
        group.bench_with_input(BenchmarkId::new("tap_fractional", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for i in 0..size {
                    let delay_time = 480.0 + (i as f32 * 0.1).sin() * 48.0;
                    sum += delay.tap(black_box(delay_time));
                }
                sum
            })
        });
    }

    group.finish();
}
