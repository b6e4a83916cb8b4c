//! Benchmarks for ADSR envelope generator.

use std::hint::black_box;

use chordwave::dsp::envelope::{Adsr, Envelope};
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

fn envelope(attack: f32, decay: f32, sustain: f32, release: f32) -> Envelope {
    let adsr = Adsr::new(attack, decay, sustain, release).expect("valid adsr");
    let mut env = Envelope::new(adsr, SAMPLE_RATE);
    env.note_on();
    env
}

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (ramping up)
        let mut env = envelope(10.0, 0.1, 0.7, 0.3);
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| env.render(black_box(&mut buffer)))
        });

        // Sustain phase (holding steady)
        let mut env = envelope(0.001, 0.001, 0.7, 0.3);
        for _ in 0..200 {
            env.next_sample();
        }
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| env.render(black_box(&mut buffer)))
        });

        // Release phase (ramping down)
        let mut env = envelope(0.001, 0.001, 0.7, 10.0);
        for _ in 0..200 {
            env.next_sample();
        }
        env.note_off();
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| env.render(black_box(&mut buffer)))
        });
    }

    group.finish();
}
