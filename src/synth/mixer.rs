//! Mixer: shared summing bus, headroom, normalization and the fallback tone.
//!
//! Voices rendered on worker threads write overlapping sample ranges, so the
//! bus sits behind a mutex and each voice is added in one locked pass.

use std::f32::consts::TAU;

use parking_lot::Mutex;
use tracing::warn;

use crate::dsp::mix::{clamp_in_place, normalize_above, scale_in_place, sum_into};
use crate::dsp::reverb::ReverbEngine;
use crate::error::SynthError;
use crate::io::StereoBuffer;

pub const DEFAULT_HEADROOM: f32 = 0.8;

/// Fallback tone: one second of A4 at low level, faded in and out.
pub const FALLBACK_FREQUENCY: f32 = 440.0;
pub const FALLBACK_AMPLITUDE: f32 = 0.3;
pub const FALLBACK_SECONDS: f32 = 1.0;
const FALLBACK_FADE_SECONDS: f32 = 0.01;

pub struct Mixer {
    bus: Mutex<Vec<f32>>,
    headroom: f32,
    sample_rate: u32,
}

impl Mixer {
    pub fn new(frames: usize, headroom: f32, sample_rate: u32) -> Self {
        Self {
            bus: Mutex::new(vec![0.0; frames]),
            headroom,
            sample_rate,
        }
    }

    pub fn frames(&self) -> usize {
        self.bus.lock().len()
    }

    /// Add a rendered voice starting at frame `offset`. Safe to call from many threads.
    pub fn add_voice(&self, offset: usize, samples: &[f32]) {
        let mut bus = self.bus.lock();
        sum_into(&mut bus, samples, offset, 1.0);
    }

    /// Apply reverb, headroom, normalization and clamping; emit the stereo buffer.
    pub fn finish(self, reverb: Option<&mut ReverbEngine>) -> Result<StereoBuffer, SynthError> {
        let mut mono = self.bus.into_inner();
        if mono.is_empty() {
            return Err(SynthError::EmptyRender);
        }

        if let Some(reverb) = reverb {
            reverb.process_buffer(&mut mono);
        }

        if let Some(frame) = mono.iter().position(|s| !s.is_finite()) {
            return Err(SynthError::NonFiniteSample { frame });
        }

        scale_in_place(&mut mono, self.headroom);
        normalize_above(&mut mono, 1.0);
        clamp_in_place(&mut mono);

        Ok(StereoBuffer::from_mono(mono, self.sample_rate))
    }

    /// Like `finish`, but a synthesis fault yields the fallback tone.
    pub fn finish_or_fallback(self, reverb: Option<&mut ReverbEngine>) -> StereoBuffer {
        let sample_rate = self.sample_rate;
        or_fallback(self.finish(reverb), sample_rate)
    }
}

/// Recover from a failed render with the fallback tone.
pub fn or_fallback(result: Result<StereoBuffer, SynthError>, sample_rate: u32) -> StereoBuffer {
    result.unwrap_or_else(|err| {
        warn!(error = %err, "render failed, substituting fallback tone");
        fallback_tone(sample_rate)
    })
}

/// A short, quiet sine so callers always get a valid non-empty buffer.
pub fn fallback_tone(sample_rate: u32) -> StereoBuffer {
    let rate = sample_rate.max(1) as f32;
    let frames = ((FALLBACK_SECONDS * rate) as usize).max(1);
    let fade = ((FALLBACK_FADE_SECONDS * rate) as usize).max(1);

    let mono = (0..frames)
        .map(|n| {
            let edge = n.min(frames - 1 - n);
            let gain = (edge as f32 / fade as f32).min(1.0);
            FALLBACK_AMPLITUDE * gain * (TAU * FALLBACK_FREQUENCY * n as f32 / rate).sin()
        })
        .collect();

    StereoBuffer::from_mono(mono, sample_rate)
}
