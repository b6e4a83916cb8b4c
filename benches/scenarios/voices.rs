//! Benchmarks for voices and the block-based synth.

use std::collections::VecDeque;
use std::hint::black_box;
use std::sync::Arc;

use chordwave::synth::{InstrumentSettings, PolySynth, SynthMessage, Voice};
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    // piano, bass, strings (with vibrato), pad
    let programs: &[(&str, u8)] = &[("piano", 0), ("bass", 33), ("strings", 48), ("pad", 88)];

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for &(name, program) in programs {
            let settings = Arc::new(InstrumentSettings::for_program(program));
            let vibrato = settings.vibrato_for(program);
            let mut voice = Voice::new(settings, vibrato, 48_000.0);
            voice.start(45, 100, 0);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    // Keep the note held for the whole run
                    if voice.is_free() {
                        voice.start(45, 100, 0);
                    }
                    voice.render(black_box(&mut buffer));
                })
            });
        }

        // An eight-note chord through the live synth
        let mut queue = VecDeque::new();
        for note in [48, 52, 55, 59, 60, 64, 67, 71] {
            queue.push_back(SynthMessage::NoteOn { note, velocity: 100 });
        }
        let mut synth = PolySynth::new(48_000.0, 16, queue);
        group.bench_with_input(BenchmarkId::new("poly_8_notes", size), &size, |b, _| {
            b.iter(|| synth.render_block(black_box(&mut buffer)))
        });
    }

    group.finish();
}
