//! Reverb - Room Simulation via Delay Networks
//!
//! Reverb simulates the sound of a space by creating many delayed, decaying
//! reflections of the input signal. This engine reads several comb taps out of
//! one shared ring buffer, averages them, and diffuses the result through a
//! short serial all-pass chain.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────── ring buffer (5 s) ◄──── input + 0.5 · comb
//!                 │
//!                 ├──→ tap 1: delay₁ + pre  × exp(-5·delay₁)·decay₁ ──┐
//!                 ├──→ tap 2: delay₂ + pre  × exp(-5·delay₂)·decay₂ ──┼──→ average = comb
//!                 └──→ tap N: ...                                     ──┘
//!
//!   comb ──→ [Allpass 5ms g=.7] ──→ [Allpass 1.7ms g=.6] ──→ [Allpass 0.5ms g=.5] ──→ wet
//!
//!   out = dry · (1 - w) + wet · w · exp(-w · 0.5)
//! ```
//!
//! ## Comb Taps
//!
//! Each tap reads the buffer a fixed time in the past. Longer taps are
//! attenuated more (`exp(-5·delay)`), then scaled by their decay factor. The
//! averaged taps are fed back into the buffer at half gain, so the loop gain
//! stays below one and the tail always dies out.
//!
//! ## Allpass Filters
//!
//! Allpass filters pass all frequencies equally but shift their phase. In reverb,
//! they add density and diffusion without coloring the sound.
//!
//! ```text
//! y[n] = -g * x[n] + x[n - delay] + g * y[n - delay]
//! ```
//!
//! ## Air Absorption
//!
//! The wet path is attenuated by `exp(-w · 0.5)`: the wetter the mix, the more
//! of the tail is lost, the way high frequencies are lost over distance.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::delay::DelayLine;
use super::mix::blend_dry_wet;
use crate::error::ValidationError;

/// Ring buffer length in seconds.
pub const BUFFER_SECONDS: f32 = 5.0;
/// Gain of the comb average written back into the ring buffer.
const COMB_FEEDBACK: f32 = 0.5;
/// Max allpass filter delay: 10ms at 192kHz = 1920 samples
const MAX_ALLPASS_DELAY: usize = 1920;
/// Allpass chain: (delay seconds, gain).
const ALLPASS_STAGES: [(f32, f32); 3] = [(0.005, 0.7), (0.0017, 0.6), (0.0005, 0.5)];

/// Comb taps, mix and pre-delay of a reverb.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ReverbConfig {
    /// Tap delay times in seconds.
    pub delays: Vec<f32>,
    /// Per-tap decay factors in [0, 1], same length as `delays`.
    pub decays: Vec<f32>,
    /// Wet amount in [0, 1].
    pub wet: f32,
    /// Offset added to every tap, in seconds.
    pub pre_delay: Option<f32>,
}

impl ReverbConfig {
    pub fn small_room() -> Self {
        Self {
            delays: vec![0.0297, 0.0371, 0.0411, 0.0437],
            decays: vec![0.82, 0.8, 0.78, 0.76],
            wet: 0.2,
            pre_delay: Some(0.008),
        }
    }

    pub fn large_hall() -> Self {
        Self {
            delays: vec![0.089, 0.113, 0.137, 0.163, 0.191, 0.227],
            decays: vec![0.95, 0.93, 0.91, 0.89, 0.87, 0.85],
            wet: 0.4,
            pre_delay: Some(0.035),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |reason: String| Err(ValidationError::InvalidReverbConfig(reason));

        if self.delays.is_empty() || self.decays.is_empty() {
            return invalid("delay and decay lists must be non-empty".into());
        }
        if self.delays.len() != self.decays.len() {
            return invalid(format!(
                "{} delays but {} decays",
                self.delays.len(),
                self.decays.len()
            ));
        }
        if let Some(&d) = self.delays.iter().find(|d| !d.is_finite() || **d < 0.0) {
            return invalid(format!("delay {d} must be a non-negative time"));
        }
        if let Some(&g) = self.decays.iter().find(|g| !(0.0..=1.0).contains(*g)) {
            return invalid(format!("decay {g} outside [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.wet) {
            return invalid(format!("wet amount {} outside [0, 1]", self.wet));
        }
        if let Some(p) = self.pre_delay {
            if !p.is_finite() || p < 0.0 {
                return invalid(format!("pre-delay {p} must be a non-negative time"));
            }
        }
        Ok(())
    }
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self::small_room()
    }
}

/// An allpass filter for reverb diffusion (pre-allocated, RT-safe)
pub struct AllpassFilter {
    buffer: [f32; MAX_ALLPASS_DELAY],
    delay_samples: usize,
    write_pos: usize,
    feedback: f32,
}

impl AllpassFilter {
    pub fn new(delay_samples: usize, feedback: f32) -> Self {
        Self {
            buffer: [0.0; MAX_ALLPASS_DELAY],
            delay_samples: delay_samples.clamp(1, MAX_ALLPASS_DELAY),
            write_pos: 0,
            feedback: feedback.clamp(0.0, 0.9),
        }
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];

        // Allpass: output = -g*input + delayed + g*delayed_output
        let output = -self.feedback * input + delayed;

        // Write: input + feedback * output
        self.buffer[self.write_pos] = input + self.feedback * output;

        self.write_pos = (self.write_pos + 1) % self.delay_samples;

        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

struct CombTap {
    delay_samples: f32,
    gain: f32,
}

/// Per-session reverb state. Never shared between renders.
pub struct ReverbEngine {
    buffer: DelayLine,
    taps: Vec<CombTap>,
    allpasses: [AllpassFilter; 3],
    wet: f32,
    absorption: f32,
}

impl ReverbEngine {
    pub fn new(config: &ReverbConfig, sample_rate: f32) -> Result<Self, ValidationError> {
        config.validate()?;
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ValidationError::SampleRate(sample_rate));
        }

        let buffer = DelayLine::with_duration(BUFFER_SECONDS, sample_rate);
        let max_delay = buffer.max_delay();
        let pre_delay = config.pre_delay.unwrap_or(0.0);

        let taps = config
            .delays
            .iter()
            .zip(&config.decays)
            .map(|(&delay, &decay)| {
                let requested = (delay + pre_delay) * sample_rate;
                if requested > max_delay {
                    warn!(
                        delay_secs = delay + pre_delay,
                        capacity_secs = BUFFER_SECONDS,
                        "reverb tap exceeds buffer, clamping"
                    );
                }
                CombTap {
                    delay_samples: requested.min(max_delay),
                    gain: (-delay * 5.0).exp() * decay,
                }
            })
            .collect();

        let allpasses = ALLPASS_STAGES
            .map(|(secs, gain)| AllpassFilter::new((secs * sample_rate).round() as usize, gain));

        Ok(Self {
            buffer,
            taps,
            allpasses,
            wet: config.wet,
            absorption: (-config.wet * 0.5).exp(),
        })
    }

    /// Tap read offsets in samples, after clamping.
    pub fn tap_delays(&self) -> impl Iterator<Item = f32> + '_ {
        self.taps.iter().map(|t| t.delay_samples)
    }

    pub fn wet(&self) -> f32 {
        self.wet
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let comb = self
            .taps
            .iter()
            .map(|tap| self.buffer.tap(tap.delay_samples) * tap.gain)
            .sum::<f32>()
            / self.taps.len() as f32;

        self.buffer.push(input + COMB_FEEDBACK * comb);

        let mut wet = comb;
        for allpass in &mut self.allpasses {
            wet = allpass.process(wet);
        }

        blend_dry_wet(input, wet * self.absorption, self.wet)
    }

    pub fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.reset();
        for allpass in &mut self.allpasses {
            allpass.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44_100.0;

    fn config(delays: Vec<f32>, decays: Vec<f32>, wet: f32) -> ReverbConfig {
        ReverbConfig {
            delays,
            decays,
            wet,
            pre_delay: None,
        }
    }

    #[test]
    fn dry_only_reproduces_input() {
        let mut reverb = ReverbEngine::new(
            &ReverbConfig {
                wet: 0.0,
                ..ReverbConfig::large_hall()
            },
            SAMPLE_RATE,
        )
        .unwrap();

        for n in 0..10_000 {
            let input = (n as f32 * 0.01).sin() * 0.8;
            assert!((reverb.process(input) - input).abs() < 1e-6);
        }
    }

    #[test]
    fn impulse_produces_a_tail() {
        let mut reverb = ReverbEngine::new(&ReverbConfig::small_room(), SAMPLE_RATE).unwrap();
        assert_eq!(reverb.wet(), ReverbConfig::small_room().wet);
        let _ = reverb.process(1.0);

        // longest tap is ~52ms = ~2300 samples
        let has_tail = (0..5_000).any(|_| reverb.process(0.0).abs() > 1e-4);
        assert!(has_tail, "Reverb should produce a tail after impulse");
    }

    #[test]
    fn tail_decays_and_stays_finite() {
        let mut reverb = ReverbEngine::new(
            &config(vec![0.01, 0.013], vec![1.0, 1.0], 1.0),
            SAMPLE_RATE,
        )
        .unwrap();

        for _ in 0..10_000 {
            let out = reverb.process(0.5);
            assert!(out.is_finite());
            assert!(out.abs() < 10.0, "Reverb output unstable: {out}");
        }

        let late: f32 = (0..200_000).map(|_| reverb.process(0.0)).last().unwrap_or(1.0);
        assert!(late.abs() < 1e-3);
    }

    #[test]
    fn oversized_delay_is_clamped_not_out_of_bounds() {
        let mut reverb = ReverbEngine::new(&config(vec![60.0], vec![0.5], 0.5), 1_000.0).unwrap();
        let delays: Vec<f32> = reverb.tap_delays().collect();
        assert_eq!(delays, vec![4_999.0]);

        for _ in 0..12_000 {
            assert!(reverb.process(0.3).is_finite());
        }
    }

    #[test]
    fn pre_delay_shifts_every_tap() {
        let reverb = ReverbEngine::new(
            &ReverbConfig {
                pre_delay: Some(0.01),
                ..config(vec![0.02, 0.03], vec![0.5, 0.5], 0.3)
            },
            1_000.0,
        )
        .unwrap();
        let delays: Vec<f32> = reverb.tap_delays().collect();
        assert!((delays[0] - 30.0).abs() < 1e-3);
        assert!((delays[1] - 40.0).abs() < 1e-3);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let cases = [
            config(vec![], vec![], 0.2),
            config(vec![0.1, 0.2], vec![0.5], 0.2),
            config(vec![-0.1], vec![0.5], 0.2),
            config(vec![0.1], vec![1.5], 0.2),
            config(vec![0.1], vec![0.5], 1.2),
        ];
        for case in cases {
            assert!(
                matches!(
                    ReverbEngine::new(&case, SAMPLE_RATE),
                    Err(ValidationError::InvalidReverbConfig(_))
                ),
                "{case:?} should be rejected"
            );
        }
        assert!(ReverbConfig::small_room().validate().is_ok());
        assert!(ReverbConfig::large_hall().validate().is_ok());
    }

    #[test]
    fn allpass_preserves_energy() {
        let mut allpass = AllpassFilter::new(5, 0.5);

        let mut energy_in = 0.0;
        let mut energy_out = 0.0;

        for i in 0..100 {
            let input = if i < 10 { 1.0 } else { 0.0 };
            let output = allpass.process(input);
            energy_in += input * input;
            energy_out += output * output;
        }

        assert!(energy_out > energy_in * 0.8);
    }
}
