/*
Performance Patterns
====================

A chord in a progression says WHAT sounds and for how long. A performance
pattern says HOW it is played across that span:

    Block      all chord tones together, held for the whole span

               C5 ████████████████
               G4 ████████████████
               E4 ████████████████
               C4 ████████████████

    Arpeggio   chord tones one at a time, cycling upward, N per beat

               C5          ██          ██
               G4       ██          ██
               E4    ██          ██
               C4 ██          ██

    Strum      all chord tones on every beat, each tone slightly later than
               the one below it (like a pick crossing strings)

               G4   ███   ███   ███
               E4  ████  ████  ████
               C4 █████ █████ █████

The pattern is a pure function of the musical style: the same style always
plays the same way, which keeps generation reproducible.
*/

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::timeline::NoteEvent;
use crate::error::ValidationError;

/// Musical style requested by the caller.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Style {
    #[default]
    Pop,
    Rock,
    Jazz,
    Classical,
    Ambient,
    Electronic,
    Folk,
}

impl Style {
    pub const ALL: [Style; 7] = [
        Style::Pop,
        Style::Rock,
        Style::Jazz,
        Style::Classical,
        Style::Ambient,
        Style::Electronic,
        Style::Folk,
    ];

    pub const fn pattern(self) -> PerformancePattern {
        match self {
            Style::Classical | Style::Ambient => PerformancePattern::Block,
            Style::Pop => PerformancePattern::Arpeggio { per_beat: 2 },
            Style::Electronic => PerformancePattern::Arpeggio { per_beat: 4 },
            Style::Rock | Style::Folk => PerformancePattern::Strum { spread_ticks: 12 },
            Style::Jazz => PerformancePattern::Strum { spread_ticks: 6 },
        }
    }

    /// General MIDI program for the chord part.
    pub const fn chord_program(self) -> u8 {
        match self {
            Style::Pop => 0,         // acoustic grand piano
            Style::Rock => 29,       // overdriven guitar
            Style::Jazz => 4,        // electric piano
            Style::Classical => 48,  // string ensemble
            Style::Ambient => 89,    // warm pad
            Style::Electronic => 81, // sawtooth lead
            Style::Folk => 25,       // steel-string guitar
        }
    }

    /// General MIDI program for the bass part.
    pub const fn bass_program(self) -> u8 {
        match self {
            Style::Jazz | Style::Folk => 32, // acoustic bass
            Style::Classical => 43,          // contrabass
            Style::Electronic => 38,         // synth bass
            _ => 33,                         // finger bass
        }
    }

    pub const fn velocity(self) -> u8 {
        match self {
            Style::Rock | Style::Electronic => 100,
            Style::Ambient | Style::Classical => 70,
            _ => 85,
        }
    }
}

impl FromStr for Style {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let style = match s.trim().to_ascii_lowercase().as_str() {
            "pop" => Style::Pop,
            "rock" => Style::Rock,
            "jazz" => Style::Jazz,
            "classical" => Style::Classical,
            "ambient" => Style::Ambient,
            "electronic" | "edm" => Style::Electronic,
            "folk" => Style::Folk,
            other => {
                return Err(ValidationError::InvalidConfig(format!("unknown style '{other}'")))
            }
        };
        Ok(style)
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How chord tones are laid out over a chord's span.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformancePattern {
    /// Sustained block chord.
    Block,
    /// One tone at a time, cycling upward, `per_beat` tones per beat.
    Arpeggio { per_beat: u8 },
    /// Every tone on each beat, tone k delayed by `k * spread_ticks`.
    Strum { spread_ticks: u32 },
}

/// Where and how loud a pattern should place notes.
#[derive(Debug, Clone, Copy)]
pub struct Span {
    pub start_tick: u32,
    pub length_ticks: u32,
    pub beat_ticks: u32,
    pub velocity: u8,
    pub channel: u8,
}

impl PerformancePattern {
    /// Lay `pitches` (lowest first) out over `span`.
    pub fn expand(&self, pitches: &[u8], span: Span) -> Vec<NoteEvent> {
        if pitches.is_empty() || span.length_ticks == 0 {
            return Vec::new();
        }

        let end = span.start_tick + span.length_ticks;
        let note = |pitch: u8, start: u32, until: u32, velocity: u8| NoteEvent {
            pitch,
            start_tick: start,
            duration_ticks: until.saturating_sub(start).max(1),
            velocity,
            channel: span.channel,
        };

        match *self {
            PerformancePattern::Block => pitches
                .iter()
                .map(|&p| note(p, span.start_tick, end, span.velocity))
                .collect(),

            PerformancePattern::Arpeggio { per_beat } => {
                let step = (span.beat_ticks / per_beat.max(1) as u32).max(1);
                (span.start_tick..end)
                    .step_by(step as usize)
                    .enumerate()
                    .map(|(i, tick)| {
                        let pitch = pitches[i % pitches.len()];
                        note(pitch, tick, (tick + step).min(end), span.velocity)
                    })
                    .collect()
            }

            PerformancePattern::Strum { spread_ticks } => {
                let beat = span.beat_ticks.max(1);
                let mut events = Vec::new();
                for (hit, tick) in (span.start_tick..end).step_by(beat as usize).enumerate() {
                    let until = (tick + beat).min(end);
                    // accent the first hit of each chord
                    let velocity = if hit == 0 {
                        span.velocity
                    } else {
                        span.velocity.saturating_sub(12)
                    };
                    for (k, &pitch) in pitches.iter().enumerate() {
                        let start = (tick + k as u32 * spread_ticks).min(until.saturating_sub(1));
                        events.push(note(pitch, start, until, velocity));
                    }
                }
                events
            }
        }
    }
}
