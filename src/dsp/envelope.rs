#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::ValidationError, MIN_TIME};

/*
ADSR Envelope Implementation
============================

This module implements the per-voice amplitude envelope: a linear ADSR
generator driven by elapsed time since note-on.

Vocabulary
----------

  level       The envelope's current output value (0.0 to 1.0). This multiplies
              the oscillator output to control its amplitude over time.

  stage       Which phase of the envelope we're in: Attack, Decay, Sustain,
              Release or Finished. A state machine governs transitions.

  elapsed     Samples since note-on (or since release). Levels are computed
              from elapsed TIME, not accumulated per-sample increments, so
              long notes never drift.


The Shape: Linear Ramps
-----------------------

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release
         (A)   (D)      (S)      (R)

  Attack    t ∈ [0, A)        level = t / A
  Decay     t ∈ [A, A + D)    level = 1 + (S - 1) · (t - A) / D
  Sustain   t ≥ A + D         level = S            (until note_off)
  Release   r ∈ [0, R]        level = L₀ · (1 - r / R)
  Finished  r > R             level = 0

where L₀ is the level captured at the moment of note_off and r is the time
since release.

Release is LINEAR. Exponential release is the other common choice; linear
was picked so a release always ends at exactly 0.0 at r = R and the voice can
be freed deterministically.


The State Machine
-----------------

    ┌────────┐ t ≥ A ┌───────┐ t ≥ A+D ┌─────────┐
    │ Attack │──────→│ Decay │────────→│ Sustain │
    └────────┘       └───────┘         └─────────┘
         │               │                  │
         │ note_off      │ note_off         │ note_off
         ↓               ↓                  ↓
    ┌──────────────────────────────────────────┐  r > R  ┌──────────┐
    │                 Release                  │───────→│ Finished │
    └──────────────────────────────────────────┘        └──────────┘

note_off triggers Release from ANY stage. Release always starts from the
CURRENT level, not the sustain level, which prevents clicks when releasing
during attack.

Numeric Contract
----------------

Output is always within [0, 1]. Sustain is clamped when the parameters are
built, never when read. Zero-length stages are stretched to MIN_TIME so
Envelope(0) is always 0.
*/

/// ADSR parameters. Times in seconds.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    attack: f32,
    decay: f32,
    sustain: f32,
    release: f32,
}

impl Adsr {
    /// Negative or non-finite times are rejected; sustain is clamped to [0, 1].
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Result<Self, ValidationError> {
        for (name, value) in [("attack", attack), ("decay", decay), ("release", release)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::NegativeTime { name, value });
            }
        }

        Ok(Self {
            attack,
            decay,
            sustain: if sustain.is_finite() { sustain.clamp(0.0, 1.0) } else { 0.0 },
            release,
        })
    }

    /// Unchecked constructor for built-in presets.
    pub(crate) const fn preset(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    pub fn attack(&self) -> f32 {
        self.attack
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    pub fn sustain(&self) -> f32 {
        self.sustain
    }

    pub fn release(&self) -> f32 {
        self.release
    }

    /// Level at `t` seconds after note-on, assuming the note is still held.
    pub fn held_level(&self, t: f32) -> f32 {
        let attack = self.attack.max(MIN_TIME);
        let decay = self.decay.max(MIN_TIME);

        let level = if t < attack {
            t / attack
        } else if t < attack + decay {
            1.0 + (self.sustain - 1.0) * (t - attack) / decay
        } else {
            self.sustain
        };
        level.clamp(0.0, 1.0)
    }

    /// Level `r` seconds after release began from `start_level`.
    pub fn released_level(&self, start_level: f32, r: f32) -> f32 {
        let release = self.release.max(MIN_TIME);
        (start_level * (1.0 - r / release)).clamp(0.0, 1.0)
    }
}

impl Default for Adsr {
    fn default() -> Self {
        Self {
            attack: 0.01,  // 10ms default
            decay: 0.1,    // 100ms default
            sustain: 0.7,  // 70% level default
            release: 0.3,  // 300ms default
        }
    }
}

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Attack,   // Ramping up to 1.0
    Decay,    // Reached peak, ramping down to sustain level
    Sustain,  // Holding at sustain level until note_off
    Release,  // Ramping from the captured level down to 0
    Finished, // Silent; the owning voice can be removed
}

pub struct Envelope {
    params: Adsr,
    sample_rate: f32,

    // Runtime state (changes every sample)
    stage: EnvelopeState,
    level: f32,
    elapsed_samples: u64,

    // Release bookkeeping (snapshotted at note_off)
    release_start_level: f32,
    release_elapsed_samples: u64,
}

impl Envelope {
    /// A new envelope starts in Attack: voices are created on note-on.
    pub fn new(params: Adsr, sample_rate: f32) -> Self {
        Self {
            params,
            sample_rate: sample_rate.max(1.0),
            stage: EnvelopeState::Attack,
            level: 0.0,
            elapsed_samples: 0,
            release_start_level: 0.0,
            release_elapsed_samples: 0,
        }
    }

    /// Restart the attack phase from zero.
    pub fn note_on(&mut self) {
        self.stage = EnvelopeState::Attack;
        self.level = 0.0;
        self.elapsed_samples = 0;
        self.release_elapsed_samples = 0;
    }

    /// Start the release phase from the current level.
    pub fn note_off(&mut self) {
        if matches!(self.stage, EnvelopeState::Release | EnvelopeState::Finished) {
            return;
        }

        // Snapshot current level - we'll interpolate from here to 0
        self.release_start_level = self.level;
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeState::Release;
    }

    /// Output the level for the current sample, then advance by one sample.
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeState::Attack | EnvelopeState::Decay | EnvelopeState::Sustain => {
                let t = self.elapsed_samples as f32 / self.sample_rate;
                self.level = self.params.held_level(t);
                self.stage = self.held_stage(t);
                self.elapsed_samples += 1;
            }

            EnvelopeState::Release => {
                let r = self.release_elapsed_samples as f32 / self.sample_rate;
                if r > self.params.release.max(MIN_TIME) {
                    self.level = 0.0;
                    self.stage = EnvelopeState::Finished;
                } else {
                    self.level = self.params.released_level(self.release_start_level, r);
                    self.release_elapsed_samples += 1;
                }
            }

            EnvelopeState::Finished => {
                self.level = 0.0;
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    fn held_stage(&self, t: f32) -> EnvelopeState {
        let attack = self.params.attack.max(MIN_TIME);
        if t < attack {
            EnvelopeState::Attack
        } else if t < attack + self.params.decay.max(MIN_TIME) {
            EnvelopeState::Decay
        } else {
            EnvelopeState::Sustain
        }
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.stage == EnvelopeState::Finished
    }

    pub fn is_releasing(&self) -> bool {
        self.stage == EnvelopeState::Release
    }

    /// Get the current envelope level (0.0 to 1.0)
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Get the current envelope stage
    pub fn state(&self) -> EnvelopeState {
        self.stage
    }

    pub fn params(&self) -> &Adsr {
        &self.params
    }
}
