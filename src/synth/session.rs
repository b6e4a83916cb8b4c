//! Offline rendering of a whole timeline.
//!
//! Each note becomes one voice rendered start to finish on its own. Voices are
//! independent, so above `parallel_threshold` they render on the rayon pool
//! and are summed into the mixer's locked bus as they complete.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::config::RenderConfig;
use crate::dsp::lfo::Vibrato;
use crate::dsp::reverb::ReverbEngine;
use crate::error::{SynthError, ValidationError};
use crate::io::{end_secs, schedule, ScheduledNote, StereoBuffer};
use crate::sequencing::timeline::Timeline;
use crate::synth::instrument::{InstrumentBank, InstrumentSettings};
use crate::synth::mixer::{or_fallback, Mixer};
use crate::synth::voice::Voice;

/// One note ready to render: everything resolved, nothing shared but `settings`.
struct VoiceJob {
    offset: usize,
    hold_samples: usize,
    pitch: u8,
    velocity: u8,
    settings: Arc<InstrumentSettings>,
    vibrato: Vibrato,
}

pub struct SynthesisSession {
    config: RenderConfig,
    bank: InstrumentBank,
    reverb: Option<ReverbEngine>,
}

impl SynthesisSession {
    pub fn new(config: RenderConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        let reverb = config
            .reverb
            .as_ref()
            .map(|reverb| ReverbEngine::new(reverb, config.sample_rate as f32))
            .transpose()?;

        Ok(Self {
            config,
            bank: InstrumentBank::new(),
            reverb,
        })
    }

    /// Override the sound of one General MIDI program.
    pub fn with_instrument(mut self, program: u8, settings: InstrumentSettings) -> Self {
        self.bank.insert(program, settings);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render `timeline`. Synthesis faults yield the mixer's fallback tone.
    pub fn render(&mut self, timeline: &Timeline) -> StereoBuffer {
        let result = self.try_render(timeline);
        or_fallback(result, self.config.sample_rate)
    }

    pub fn try_render(&mut self, timeline: &Timeline) -> Result<StereoBuffer, SynthError> {
        // refuse before scheduling a timeline that could never render
        self.check_length(end_secs(timeline))?;
        self.render_notes(&schedule(timeline))
    }

    pub fn render_notes(&mut self, notes: &[ScheduledNote]) -> Result<StereoBuffer, SynthError> {
        if notes.is_empty() {
            return Err(SynthError::EmptyRender);
        }

        let last_end = notes.iter().map(ScheduledNote::end_secs).fold(0.0, f64::max);
        let total_secs = self.check_length(last_end)?;

        let sample_rate = self.config.sample_rate;
        let frames = (total_secs * sample_rate as f64).ceil() as usize;
        let jobs = self.prepare(notes);
        let mixer = Mixer::new(frames, self.config.headroom, sample_rate);

        let render_voice = |job: &VoiceJob| {
            let mut voice = Voice::new(job.settings.clone(), job.vibrato, sample_rate as f32);
            voice.start(job.pitch, job.velocity, job.offset as u64);
            let samples = voice.render_note(job.hold_samples, frames.saturating_sub(job.offset));
            trace!(pitch = job.pitch, offset = job.offset, len = samples.len(), "rendered voice");
            mixer.add_voice(job.offset, &samples);
        };

        let parallel = jobs.len() > self.config.parallel_threshold;
        if parallel {
            jobs.par_iter().for_each(render_voice);
        } else {
            jobs.iter().for_each(render_voice);
        }

        debug!(
            voices = jobs.len(),
            frames,
            parallel,
            reverb = self.reverb.is_some(),
            "mixed voices"
        );

        if let Some(reverb) = self.reverb.as_mut() {
            reverb.reset();
        }
        mixer.finish(self.reverb.as_mut())
    }

    /// Total render length for music ending at `last_end`, if within the limit.
    fn check_length(&self, last_end: f64) -> Result<f64, SynthError> {
        let total_secs = last_end + self.config.tail_secs as f64;
        if total_secs > self.config.max_duration_secs {
            return Err(SynthError::RenderTooLong {
                secs: total_secs,
                limit: self.config.max_duration_secs,
            });
        }
        Ok(total_secs)
    }

    /// Resolve instruments and humanized velocities, in note order.
    fn prepare(&mut self, notes: &[ScheduledNote]) -> Vec<VoiceJob> {
        let rate = self.config.sample_rate as f64;
        let humanize = self.config.humanize;
        let mut rng = Pcg32::seed_from_u64(self.config.seed);

        notes
            .iter()
            .map(|note| {
                let settings = self.bank.get(note.program);
                let vibrato = settings.vibrato_for(note.program);

                let velocity = if humanize > 0.0 {
                    let jitter = rng.gen_range(-humanize..=humanize) * 127.0;
                    (note.velocity as f32 + jitter).round().clamp(1.0, 127.0) as u8
                } else {
                    note.velocity
                };

                VoiceJob {
                    offset: (note.start_secs * rate).round() as usize,
                    hold_samples: (note.duration_secs * rate).round() as usize,
                    pitch: note.pitch,
                    velocity,
                    settings,
                    vibrato,
                }
            })
            .collect()
    }
}
