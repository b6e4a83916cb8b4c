use std::sync::Arc;

use crate::dsp::envelope::Envelope;
use crate::dsp::lfo::Vibrato;
use crate::dsp::oscillator::HarmonicOscillator;
use crate::synth::instrument::InstrumentSettings;
use crate::theory::pitch::midi_note_to_freq;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Playing, envelope in attack/decay/sustain
    Releasing, // Key released, envelope in release phase
}

/// A single additive voice: oscillator × envelope × velocity.
pub struct Voice {
    note: u8,
    velocity: f32,
    state: VoiceState,
    age: u64,
    sample_rate: f32,
    settings: Arc<InstrumentSettings>,
    vibrato: Vibrato,
    envelope: Envelope,
    oscillator: HarmonicOscillator,
    elapsed_samples: u64,
    released_at: Option<u64>,
}

impl Voice {
    /// A free voice playing `settings` with an already family-scaled vibrato.
    pub fn new(settings: Arc<InstrumentSettings>, vibrato: Vibrato, sample_rate: f32) -> Self {
        Self {
            note: 0,
            velocity: 0.0,
            state: VoiceState::Free,
            age: 0,
            sample_rate,
            envelope: Envelope::new(settings.envelope, sample_rate),
            oscillator: HarmonicOscillator::new(&settings.harmonics, 0.0, sample_rate),
            vibrato,
            settings,
            elapsed_samples: 0,
            released_at: None,
        }
    }

    /// Swap the instrument. Takes effect on the next `start`.
    pub fn set_instrument(&mut self, settings: Arc<InstrumentSettings>, vibrato: Vibrato) {
        self.settings = settings;
        self.vibrato = vibrato;
    }

    /// Note-on. `velocity` is MIDI 0..=127.
    pub fn start(&mut self, note: u8, velocity: u8, age: u64) {
        self.note = note;
        self.velocity = velocity.min(127) as f32 / 127.0;
        self.state = VoiceState::Active;
        self.age = age;
        self.elapsed_samples = 0;
        self.released_at = None;

        self.envelope = Envelope::new(self.settings.envelope, self.sample_rate);
        self.oscillator =
            HarmonicOscillator::new(&self.settings.harmonics, midi_note_to_freq(note), self.sample_rate)
                .with_vibrato(self.vibrato);
    }

    pub fn release(&mut self) {
        if self.state == VoiceState::Active {
            self.state = VoiceState::Releasing;
            self.released_at = Some(self.elapsed_samples);
            self.envelope.note_off();
        }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.state == VoiceState::Free {
            return 0.0;
        }

        let sample = self.oscillator.next_sample() * self.envelope.next_sample() * self.velocity;
        self.elapsed_samples += 1;

        // If voice is releasing and envelope has finished, mark as free
        if self.envelope.is_finished() {
            self.free();
        }
        sample
    }

    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Render a whole note held for `hold_samples`, release included.
    ///
    /// Stops at the end of the release or at `max_samples`, whichever is first.
    pub fn render_note(&mut self, hold_samples: usize, max_samples: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(hold_samples.min(max_samples));
        while out.len() < max_samples && !self.is_free() {
            if out.len() == hold_samples {
                self.release();
            }
            out.push(self.next_sample());
        }
        out
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    pub fn envelope_level(&self) -> f32 {
        self.envelope.level()
    }

    pub fn free(&mut self) {
        self.state = VoiceState::Free;
        self.note = 0;
        self.velocity = 0.0;
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn frequency(&self) -> f32 {
        self.oscillator.frequency()
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    /// Samples since note-on, and since note-off if released.
    pub fn elapsed(&self) -> (u64, Option<u64>) {
        (
            self.elapsed_samples,
            self.released_at.map(|at| self.elapsed_samples - at),
        )
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn settings(&self) -> &InstrumentSettings {
        &self.settings
    }
}
