//! Vibrato: a sine LFO applied to oscillator frequency.

/*
Low Frequency Oscillators
=========================

An LFO is an oscillator running at sub-audio frequencies. The waveform math
is the same as an audio oscillator; the output modulates a parameter instead
of being heard directly.

Vocabulary
----------

  control-rate    Frequencies below human hearing: ~0.01 Hz to ~20 Hz.
                  These oscillators modulate parameters over time.

  depth           How far the modulated parameter swings, as a fraction of
                  its center value. A depth of 0.005 moves pitch ±0.5%
                  (about ±9 cents).

  rate            LFO frequency in Hz. 2-7 Hz is the vibrato sweet spot;
                  slower reads as a sweep, faster as a warble.

  bipolar         Output swings positive AND negative: -1.0 to +1.0.
                  Vibrato is bipolar: pitch goes sharp AND flat.


Vibrato
-------

Vibrato scales the effective frequency of a voice every sample:

    f_eff(t) = f · (1 + depth · sin(2π · rate · t))

The oscillator integrates f_eff into its phase, so a changing frequency never
produces a discontinuity in the waveform.

        f · (1 + depth) ┤   ╭─╮       ╭─╮
                      f ┤──╯   ╲     ╱   ╲
        f · (1 - depth) ┤       ╰───╯     ╰──
                        └─────────────────────→ t
                            1 / rate

Instrument families play vibrato differently. Bowed strings lean on it more
than a piano patch, voices more than strings. A family scale multiplies both
depth and rate before the formula above is applied.
*/

use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Vibrato parameters. `depth <= 0` disables it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vibrato {
    pub depth: f32,
    pub rate: f32,
}

impl Vibrato {
    pub const OFF: Vibrato = Vibrato {
        depth: 0.0,
        rate: 0.0,
    };

    pub const fn new(depth: f32, rate: f32) -> Self {
        Self { depth, rate }
    }

    pub fn is_active(&self) -> bool {
        self.depth > 0.0 && self.rate > 0.0
    }

    /// Scale depth and rate by a family's coefficients.
    pub fn scaled(self, scale: VibratoScale) -> Self {
        Self {
            depth: self.depth * scale.depth,
            rate: self.rate * scale.rate,
        }
    }

    /// Frequency multiplier at `t` seconds: `1 + depth · sin(2π · rate · t)`.
    #[inline]
    pub fn factor(&self, t: f32) -> f32 {
        if !self.is_active() {
            return 1.0;
        }
        1.0 + self.depth * (TAU * self.rate * t).sin()
    }
}

impl Default for Vibrato {
    fn default() -> Self {
        Self::OFF
    }
}

/// Per-family multipliers for vibrato depth and rate.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VibratoScale {
    pub depth: f32,
    pub rate: f32,
}

impl VibratoScale {
    pub const UNITY: VibratoScale = VibratoScale {
        depth: 1.0,
        rate: 1.0,
    };
}

/// Calculate LFO period in seconds from frequency.
#[inline]
pub fn period_from_frequency(frequency_hz: f32) -> f32 {
    1.0 / frequency_hz
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_vibrato_is_unity() {
        assert_eq!(Vibrato::OFF.factor(0.123), 1.0);
        assert_eq!(Vibrato::new(0.0, 5.0).factor(0.05), 1.0);
        assert_eq!(Vibrato::new(0.01, 0.0).factor(0.05), 1.0);
    }

    #[test]
    fn factor_peaks_a_quarter_period_in() {
        let vibrato = Vibrato::new(0.01, 5.0);
        let quarter = period_from_frequency(5.0) / 4.0;
        assert!((vibrato.factor(quarter) - 1.01).abs() < 1e-5);
        assert!((vibrato.factor(3.0 * quarter) - 0.99).abs() < 1e-5);
        assert!((vibrato.factor(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn scaling_multiplies_depth_and_rate() {
        let scaled = Vibrato::new(0.004, 5.0).scaled(VibratoScale {
            depth: 1.5,
            rate: 0.9,
        });
        assert!((scaled.depth - 0.006).abs() < 1e-7);
        assert!((scaled.rate - 4.5).abs() < 1e-6);
        assert_eq!(Vibrato::new(0.004, 5.0).scaled(VibratoScale::UNITY), Vibrato::new(0.004, 5.0));
    }
}
