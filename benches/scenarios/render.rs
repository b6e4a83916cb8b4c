//! Benchmarks for offline song rendering.
//!
//! These run the whole path: resolve, sequence, render voices, reverb and
//! master. The rayon threshold is varied to compare serial and parallel.

use std::hint::black_box;

use chordwave::{generate, GenerationRequest, Key, Mode, RenderConfig, Style, SynthesisSession};
use criterion::{BenchmarkId, Criterion};

pub fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/render");
    group.sample_size(10);

    let request = GenerationRequest::new("I-vi-IV-V-I-vi-ii-V", Key::C, Mode::Major)
        .style(Style::Pop)
        .bpm(120.0);
    let song = generate(&request).expect("valid request");

    let variants = [
        ("serial_dry", usize::MAX, None),
        ("parallel_dry", 0, None),
        ("parallel_room", 0, Some(chordwave::dsp::ReverbConfig::small_room())),
    ];

    for (name, parallel_threshold, reverb) in variants {
        let config = RenderConfig {
            sample_rate: 22_050,
            parallel_threshold,
            reverb,
            ..RenderConfig::default()
        };
        let mut session = SynthesisSession::new(config).expect("valid config");
        group.bench_with_input(BenchmarkId::new(name, "8_bars"), &song.timeline, |b, timeline| {
            b.iter(|| session.render(black_box(timeline)))
        });
    }

    group.finish();
}
