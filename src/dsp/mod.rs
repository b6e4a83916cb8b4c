//! Low-level DSP primitives used by the synthesizer.
//!
//! These components own no voices and know nothing about notes. They stay
//! focused on the signal-processing math so `synth` can layer on voice
//! lifecycle and mixing.

/// Fixed-capacity ring buffer with fractional reads.
pub mod delay;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Harmonic lists and waveform presets.
pub mod harmonic;
/// Vibrato LFO.
pub mod lfo;
/// Summing, gain and limiting helpers.
pub mod mix;
/// Additive oscillator.
pub mod oscillator;
/// Comb + all-pass reverb.
pub mod reverb;

pub use envelope::{Adsr, Envelope, EnvelopeState};
pub use harmonic::{Harmonic, WaveType};
pub use lfo::{Vibrato, VibratoScale};
pub use oscillator::HarmonicOscillator;
pub use reverb::{ReverbConfig, ReverbEngine};
