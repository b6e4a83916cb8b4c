//! Benchmarks for the additive oscillator.

use std::hint::black_box;

use chordwave::dsp::HarmonicOscillator;
use chordwave::dsp::harmonic::WaveType;
use chordwave::dsp::lfo::Vibrato;
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    // Partial count dominates the cost
    let waves = [
        ("sine", WaveType::Sine, 1),
        ("square_8", WaveType::Square, 8),
        ("sawtooth_16", WaveType::Sawtooth, 16),
        ("sawtooth_64", WaveType::Sawtooth, 64),
    ];

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for (name, wave, partials) in waves {
            let mut osc = HarmonicOscillator::new(&wave.harmonics(partials), 110.0, 48_000.0);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| osc.render(black_box(&mut buffer)))
            });
        }

        let mut osc = HarmonicOscillator::new(&WaveType::Sawtooth.harmonics(16), 110.0, 48_000.0)
            .with_vibrato(Vibrato::new(0.01, 5.5));
        group.bench_with_input(BenchmarkId::new("sawtooth_16_vibrato", size), &size, |b, _| {
            b.iter(|| osc.render(black_box(&mut buffer)))
        });
    }

    group.finish();
}
