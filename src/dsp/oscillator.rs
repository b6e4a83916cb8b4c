//! Additive oscillator: a sum of sine partials.
//!
//! ```text
//! sample(t) = Σᵢ aᵢ · sin(2π · f · rᵢ · t + φᵢ) / Σᵢ |aᵢ|
//! ```
//!
//! Dividing by the absolute amplitude sum bounds the output to [-1, 1] for
//! any harmonic list. An all-zero list skips the division and stays silent.

use std::f64::consts::TAU;

use super::harmonic::{amplitude_sum, Harmonic};
use super::lfo::Vibrato;

/// Sample a harmonic list at time `t` with no vibrato.
pub fn sample_at(harmonics: &[Harmonic], frequency: f32, t: f32) -> f32 {
    let phase = frequency as f64 * t as f64;
    partial_sum(harmonics, phase) * normalization(harmonics)
}

#[inline]
fn partial_sum(harmonics: &[Harmonic], phase: f64) -> f32 {
    harmonics
        .iter()
        .map(|h| h.amplitude * (TAU * phase * h.ratio as f64 + h.phase as f64).sin() as f32)
        .sum()
}

fn normalization(harmonics: &[Harmonic]) -> f32 {
    let sum = amplitude_sum(harmonics);
    if sum > 0.0 {
        1.0 / sum
    } else {
        1.0
    }
}

pub struct HarmonicOscillator {
    /// Partials below Nyquist at the base frequency.
    partials: Vec<Harmonic>,
    /// Computed from the full list so dropping partials never raises the peak.
    gain: f32,
    frequency: f32,
    vibrato: Vibrato,
    sample_rate: f32,
    /// Fundamental phase in cycles. Not wrapped: ratios may be fractional.
    phase: f64,
    elapsed_samples: u64,
}

impl HarmonicOscillator {
    pub fn new(harmonics: &[Harmonic], frequency: f32, sample_rate: f32) -> Self {
        let sample_rate = sample_rate.max(1.0);
        let nyquist = sample_rate * 0.5;
        let partials = harmonics
            .iter()
            .copied()
            .filter(|h| h.ratio * frequency < nyquist)
            .collect();

        Self {
            partials,
            gain: normalization(harmonics),
            frequency,
            vibrato: Vibrato::OFF,
            sample_rate,
            phase: 0.0,
            elapsed_samples: 0,
        }
    }

    pub fn with_vibrato(mut self, vibrato: Vibrato) -> Self {
        self.vibrato = vibrato;
        self
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Effective frequency at the current sample.
    pub fn effective_frequency(&self) -> f32 {
        let t = self.elapsed_samples as f32 / self.sample_rate;
        self.frequency * self.vibrato.factor(t)
    }

    /// Normalized sample in [-1, 1], then advance by one sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let value = partial_sum(&self.partials, self.phase) * self.gain;

        self.phase += self.effective_frequency() as f64 / self.sample_rate as f64;
        self.elapsed_samples += 1;

        value
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.elapsed_samples = 0;
    }
}
