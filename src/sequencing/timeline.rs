//! In-memory note/meta event timeline.
//!
//! This is the hand-off format on both sides of the sequencer: generation
//! produces a [`Timeline`], editing mutates one that an external decoder
//! supplied, and a container writer serializes it. Byte layout is not
//! modelled here.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default timing resolution (pulses per quarter note).
pub const DEFAULT_TICKS_PER_QUARTER: u16 = 480;

/// Tempo used when a timeline carries no tempo event.
pub const DEFAULT_BPM: f64 = 120.0;

const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// Microseconds per quarter note for a tempo.
pub fn micros_per_quarter(bpm: f64) -> u32 {
    (MICROS_PER_MINUTE / bpm).round() as u32
}

pub fn bpm_from_micros(micros_per_quarter: u32) -> f64 {
    MICROS_PER_MINUTE / micros_per_quarter.max(1) as f64
}

/// A single sounding note.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    /// MIDI note number
    pub pitch: u8,
    /// When this note starts (in ticks from timeline start)
    pub start_tick: u32,
    /// How long it sounds (in ticks)
    pub duration_ticks: u32,
    /// MIDI velocity (0-127)
    pub velocity: u8,
    /// MIDI channel (0-15)
    pub channel: u8,
}

impl NoteEvent {
    pub fn end_tick(&self) -> u32 {
        self.start_tick.saturating_add(self.duration_ticks)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaEvent {
    Tempo { micros_per_quarter: u32 },
    TimeSignature { numerator: u8, denominator: u8 },
    TrackName(String),
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEvent {
    Note(NoteEvent),
    ProgramChange { tick: u32, channel: u8, program: u8 },
    Meta { tick: u32, meta: MetaEvent },
}

impl TimelineEvent {
    pub fn tick(&self) -> u32 {
        match self {
            TimelineEvent::Note(note) => note.start_tick,
            TimelineEvent::ProgramChange { tick, .. } | TimelineEvent::Meta { tick, .. } => *tick,
        }
    }

    /// Meta and program events sort ahead of notes on the same tick.
    fn order(&self) -> u8 {
        match self {
            TimelineEvent::Meta { .. } => 0,
            TimelineEvent::ProgramChange { .. } => 1,
            TimelineEvent::Note(_) => 2,
        }
    }

    pub fn tempo(&self) -> Option<u32> {
        match self {
            TimelineEvent::Meta {
                meta: MetaEvent::Tempo { micros_per_quarter },
                ..
            } => Some(*micros_per_quarter),
            _ => None,
        }
    }
}

/// One track: an ordered list of events.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    pub events: Vec<TimelineEvent>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            events: vec![TimelineEvent::Meta {
                tick: 0,
                meta: MetaEvent::TrackName(name.into()),
            }],
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.events.iter().find_map(|e| match e {
            TimelineEvent::Meta {
                meta: MetaEvent::TrackName(name),
                ..
            } => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn push(&mut self, event: TimelineEvent) {
        self.events.push(event);
    }

    /// Stable sort by tick (meta, then program changes, then notes).
    pub fn sort(&mut self) {
        self.events.sort_by_key(|e| (e.tick(), e.order()));
    }

    pub fn notes(&self) -> impl Iterator<Item = &NoteEvent> {
        self.events.iter().filter_map(|e| match e {
            TimelineEvent::Note(note) => Some(note),
            _ => None,
        })
    }
}

/// A multi-track event collection with a fixed tick resolution.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    ticks_per_quarter: u16,
    tracks: Vec<Track>,
}

impl Timeline {
    pub fn new(ticks_per_quarter: u16) -> Self {
        Self {
            ticks_per_quarter: ticks_per_quarter.max(1),
            tracks: Vec::new(),
        }
    }

    pub fn with_tracks(ticks_per_quarter: u16, tracks: Vec<Track>) -> Self {
        Self {
            ticks_per_quarter: ticks_per_quarter.max(1),
            tracks,
        }
    }

    pub fn ticks_per_quarter(&self) -> u16 {
        self.ticks_per_quarter
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Append a track and return its index.
    pub fn push_track(&mut self, track: Track) -> usize {
        self.tracks.push(track);
        self.tracks.len() - 1
    }

    pub fn track(&self, index: usize) -> Result<&Track, ValidationError> {
        self.tracks.get(index).ok_or(ValidationError::TrackNotFound {
            index,
            track_count: self.tracks.len(),
        })
    }

    pub fn track_mut(&mut self, index: usize) -> Result<&mut Track, ValidationError> {
        let track_count = self.tracks.len();
        self.tracks
            .get_mut(index)
            .ok_or(ValidationError::TrackNotFound { index, track_count })
    }

    pub(crate) fn tracks_mut(&mut self) -> &mut Vec<Track> {
        &mut self.tracks
    }

    /// Every note across all tracks, track by track.
    pub fn note_events(&self) -> impl Iterator<Item = &NoteEvent> {
        self.tracks.iter().flat_map(Track::notes)
    }

    /// Tick where the last note ends.
    pub fn end_tick(&self) -> u32 {
        self.note_events().map(NoteEvent::end_tick).max().unwrap_or(0)
    }

    /// Tempo changes as (tick, microseconds per quarter), sorted by tick.
    pub fn tempo_map(&self) -> Vec<(u32, u32)> {
        let mut map: Vec<(u32, u32)> = self
            .tracks
            .iter()
            .flat_map(|t| t.events.iter())
            .filter_map(|e| e.tempo().map(|micros| (e.tick(), micros)))
            .collect();
        map.sort_by_key(|(tick, _)| *tick);
        map
    }

    /// Tempo in effect at tick 0.
    pub fn bpm(&self) -> f64 {
        match self.tempo_map().first() {
            Some((0, micros)) => bpm_from_micros(*micros),
            _ => DEFAULT_BPM,
        }
    }

    /// Program selected on `channel` at `tick` (0 when none was set).
    pub fn program_at(&self, channel: u8, tick: u32) -> u8 {
        self.tracks
            .iter()
            .flat_map(|t| t.events.iter())
            .filter_map(|e| match e {
                TimelineEvent::ProgramChange {
                    tick: at,
                    channel: ch,
                    program,
                } if *ch == channel && *at <= tick => Some((*at, *program)),
                _ => None,
            })
            .max_by_key(|(at, _)| *at)
            .map_or(0, |(_, program)| program)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(DEFAULT_TICKS_PER_QUARTER)
    }
}
