//! Harmonic sets and waveform presets.
//!
//! Every waveform is a list of partials. Presets are plain functions that
//! build that list from the Fourier series of the classic shapes:
//!
//! ```text
//! Sine       n = 1                       a = 1
//! Square     n = 1, 3, 5, 7, ...         a = 1/n
//! Sawtooth   n = 1, 2, 3, 4, ...         a = 1/n
//! Triangle   n = 1, 3, 5, 7, ...         a = ±1/n²   (sign alternates)
//! ```

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Partials generated for the band-limited presets.
pub const DEFAULT_PARTIALS: usize = 16;

/// One sine partial of an additive voice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic {
    /// Frequency relative to the fundamental.
    pub ratio: f32,
    pub amplitude: f32,
    /// Phase offset in radians.
    pub phase: f32,
}

impl Harmonic {
    pub const fn new(ratio: f32, amplitude: f32) -> Self {
        Self {
            ratio,
            amplitude,
            phase: 0.0,
        }
    }

    pub const fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase;
        self
    }
}

/// Waveform tag carried by instrument settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WaveType {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
    /// Harmonics supplied explicitly.
    Custom,
}

impl WaveType {
    /// Preset harmonic list with `partials` entries. `Custom` has no preset.
    pub fn harmonics(self, partials: usize) -> Vec<Harmonic> {
        match self {
            WaveType::Sine => sine(),
            WaveType::Square => square(partials),
            WaveType::Sawtooth => sawtooth(partials),
            WaveType::Triangle => triangle(partials),
            WaveType::Custom => Vec::new(),
        }
    }
}

impl FromStr for WaveType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" | "sin" => Ok(WaveType::Sine),
            "square" | "sqr" => Ok(WaveType::Square),
            "sawtooth" | "saw" => Ok(WaveType::Sawtooth),
            "triangle" | "tri" => Ok(WaveType::Triangle),
            other => Err(ValidationError::InvalidConfig(format!("unknown wave type '{other}'"))),
        }
    }
}

impl fmt::Display for WaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WaveType::Sine => "sine",
            WaveType::Square => "square",
            WaveType::Sawtooth => "sawtooth",
            WaveType::Triangle => "triangle",
            WaveType::Custom => "custom",
        };
        f.write_str(name)
    }
}

pub fn sine() -> Vec<Harmonic> {
    vec![Harmonic::new(1.0, 1.0)]
}

pub fn square(partials: usize) -> Vec<Harmonic> {
    odd_numbers(partials)
        .map(|n| Harmonic::new(n, 1.0 / n))
        .collect()
}

pub fn sawtooth(partials: usize) -> Vec<Harmonic> {
    (1..=partials.max(1))
        .map(|n| {
            let n = n as f32;
            Harmonic::new(n, 1.0 / n)
        })
        .collect()
}

pub fn triangle(partials: usize) -> Vec<Harmonic> {
    odd_numbers(partials)
        .enumerate()
        .map(|(k, n)| {
            let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
            Harmonic::new(n, sign / (n * n))
        })
        .collect()
}

fn odd_numbers(count: usize) -> impl Iterator<Item = f32> {
    (0..count.max(1)).map(|k| (2 * k + 1) as f32)
}

/// Sum of absolute amplitudes, the oscillator's normalization divisor.
pub fn amplitude_sum(harmonics: &[Harmonic]) -> f32 {
    harmonics.iter().map(|h| h.amplitude.abs()).sum()
}
