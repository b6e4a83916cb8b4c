//! Benchmarks for low-level DSP primitives.

mod delay;
mod envelope;
mod mix;
mod oscillator;
mod reverb;

pub use delay::bench_delay;
pub use envelope::bench_envelope;
pub use mix::bench_mix;
pub use oscillator::bench_oscillator;
pub use reverb::bench_reverb;
