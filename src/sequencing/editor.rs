//! Editing mode: tempo and instrument changes on an existing timeline.
//!
//! Every operation validates all of its inputs before touching the timeline,
//! so a rejected edit leaves it exactly as it was. Note tick positions are
//! never moved.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::timeline::{micros_per_quarter, MetaEvent, Timeline, TimelineEvent, Track};
use crate::error::ValidationError;

pub const MIN_BPM: f64 = 1.0;
pub const MAX_BPM: f64 = 300.0;
pub const MAX_PROGRAM: u32 = 127;
pub const MAX_CHANNEL: u32 = 15;

pub fn validate_bpm(bpm: f64) -> Result<(), ValidationError> {
    if bpm.is_finite() && (MIN_BPM..=MAX_BPM).contains(&bpm) {
        Ok(())
    } else {
        Err(ValidationError::BpmOutOfRange(bpm))
    }
}

/// Instrument ids outside 0..=127 are rejected, never clamped.
pub fn validate_program(program: u32) -> Result<u8, ValidationError> {
    if program <= MAX_PROGRAM {
        Ok(program as u8)
    } else {
        Err(ValidationError::InstrumentOutOfRange(program))
    }
}

pub fn validate_channel(channel: u32) -> Result<u8, ValidationError> {
    if channel <= MAX_CHANNEL {
        Ok(channel as u8)
    } else {
        Err(ValidationError::ChannelOutOfRange(channel))
    }
}

/// One program change request.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrumentChange {
    pub track: usize,
    pub channel: u32,
    pub program: u32,
}

impl InstrumentChange {
    fn validate(&self, timeline: &Timeline) -> Result<(u8, u8), ValidationError> {
        let channel = validate_channel(self.channel)?;
        let program = validate_program(self.program)?;
        timeline.track(self.track)?;
        Ok((channel, program))
    }
}

/// Set a single tempo for the whole timeline.
///
/// The earliest tempo event is rewritten and moved to tick 0, and any later
/// ones are dropped; with no tempo event at all, one is inserted at tick 0 of
/// the first track. Returns the new microseconds-per-quarter value.
pub fn set_tempo(timeline: &mut Timeline, bpm: f64) -> Result<u32, ValidationError> {
    validate_bpm(bpm)?;
    let micros = micros_per_quarter(bpm);

    let first = timeline
        .tracks()
        .iter()
        .enumerate()
        .flat_map(|(t, track)| {
            track
                .events
                .iter()
                .enumerate()
                .filter(|(_, e)| e.tempo().is_some())
                .map(move |(i, e)| (e.tick(), t, i))
        })
        .min();

    let tracks = timeline.tracks_mut();
    match first {
        Some((tick, keep_track, keep_index)) => {
            for (t, track) in tracks.iter_mut().enumerate() {
                let mut index = 0;
                track.events.retain(|e| {
                    let keep = e.tempo().is_none() || (t == keep_track && index == keep_index);
                    index += 1;
                    keep
                });
            }
            // the kept event is now the only tempo event left
            let track = &mut tracks[keep_track];
            if let Some(TimelineEvent::Meta {
                tick: event_tick,
                meta: MetaEvent::Tempo { micros_per_quarter },
            }) = track.events.iter_mut().find(|e| e.tempo().is_some())
            {
                *event_tick = 0;
                *micros_per_quarter = micros;
            }
            track.sort();
            debug!(bpm, micros, tick, track = keep_track, "replaced tempo");
        }
        None => {
            if tracks.is_empty() {
                tracks.push(Track::new());
            }
            tracks[0].events.insert(
                0,
                TimelineEvent::Meta {
                    tick: 0,
                    meta: MetaEvent::Tempo {
                        micros_per_quarter: micros,
                    },
                },
            );
            debug!(bpm, micros, "inserted tempo");
        }
    }

    Ok(micros)
}

/// Change the program on `channel` of `track`.
///
/// The first matching program change is rewritten; if the track has none
/// for that channel, one is inserted at tick 0.
pub fn set_instrument(
    timeline: &mut Timeline,
    track: usize,
    channel: u32,
    program: u32,
) -> Result<(), ValidationError> {
    let change = InstrumentChange {
        track,
        channel,
        program,
    };
    let (channel, program) = change.validate(timeline)?;
    apply_program(timeline.track_mut(track)?, channel, program);
    debug!(track, channel, program, "set instrument");
    Ok(())
}

/// Apply several instrument changes in one pass.
///
/// All changes are validated first; if any is invalid nothing is applied.
pub fn set_instruments(
    timeline: &mut Timeline,
    changes: &[InstrumentChange],
) -> Result<usize, ValidationError> {
    let validated = changes
        .iter()
        .map(|change| change.validate(timeline).map(|v| (change.track, v)))
        .collect::<Result<Vec<_>, _>>()?;

    for &(track, (channel, program)) in &validated {
        apply_program(timeline.track_mut(track)?, channel, program);
    }

    debug!(changes = validated.len(), "applied instrument changes");
    Ok(validated.len())
}

fn apply_program(track: &mut Track, channel: u8, program: u8) {
    let existing = track.events.iter_mut().find_map(|e| match e {
        TimelineEvent::ProgramChange {
            channel: ch,
            program: p,
            ..
        } if *ch == channel => Some(p),
        _ => None,
    });

    if let Some(p) = existing {
        *p = program;
        return;
    }

    // after any leading tick-0 meta events (track name, tempo)
    let at = track
        .events
        .iter()
        .position(|e| !matches!(e, TimelineEvent::Meta { tick: 0, .. }))
        .unwrap_or(track.events.len());
    track.events.insert(
        at,
        TimelineEvent::ProgramChange {
            tick: 0,
            channel,
            program,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencing::timeline::NoteEvent;

    fn note(start_tick: u32, channel: u8) -> TimelineEvent {
        TimelineEvent::Note(NoteEvent {
            pitch: 60,
            start_tick,
            duration_ticks: 240,
            velocity: 100,
            channel,
        })
    }

    fn tempo(tick: u32, micros: u32) -> TimelineEvent {
        TimelineEvent::Meta {
            tick,
            meta: MetaEvent::Tempo {
                micros_per_quarter: micros,
            },
        }
    }

    fn sample_timeline() -> Timeline {
        let mut conductor = Track::named("conductor");
        conductor.push(tempo(0, 600_000));
        conductor.push(tempo(1920, 400_000));

        let mut keys = Track::named("keys");
        keys.push(TimelineEvent::ProgramChange {
            tick: 0,
            channel: 0,
            program: 0,
        });
        keys.push(note(0, 0));
        keys.push(note(480, 0));

        let mut bass = Track::named("bass");
        bass.push(note(0, 1));
        bass.push(tempo(3840, 300_000));

        Timeline::with_tracks(480, vec![conductor, keys, bass])
    }

    fn note_ticks(timeline: &Timeline) -> Vec<u32> {
        timeline.note_events().map(|n| n.start_tick).collect()
    }

    #[test]
    fn tempo_120_is_500000_micros() {
        let mut timeline = sample_timeline();
        assert_eq!(set_tempo(&mut timeline, 120.0).unwrap(), 500_000);
        assert_eq!(timeline.tempo_map(), vec![(0, 500_000)]);
        assert_eq!(timeline.bpm(), 120.0);
    }

    #[test]
    fn tempo_change_leaves_ticks_untouched() {
        let mut timeline = sample_timeline();
        let before = note_ticks(&timeline);
        set_tempo(&mut timeline, 73.0).unwrap();
        assert_eq!(note_ticks(&timeline), before);
    }

    #[test]
    fn late_only_tempo_moves_to_tick_zero() {
        let mut keys = Track::named("keys");
        keys.push(note(0, 0));
        keys.push(tempo(1920, 400_000));
        keys.push(note(1920, 0));
        let mut timeline = Timeline::with_tracks(480, vec![keys]);
        let before = note_ticks(&timeline);

        set_tempo(&mut timeline, 60.0).unwrap();
        assert_eq!(timeline.tempo_map(), vec![(0, 1_000_000)]);
        assert_eq!(timeline.bpm(), 60.0);
        assert_eq!(note_ticks(&timeline), before);
        assert_eq!(timeline.tracks()[0].name(), Some("keys"));
    }

    #[test]
    fn tempo_inserted_when_missing() {
        let mut timeline = Timeline::with_tracks(480, vec![Track::named("only")]);
        set_tempo(&mut timeline, 60.0).unwrap();
        assert_eq!(timeline.tempo_map(), vec![(0, 1_000_000)]);
        assert!(timeline.tracks()[0].events[0].tempo().is_some());

        let mut empty = Timeline::default();
        set_tempo(&mut empty, 60.0).unwrap();
        assert_eq!(empty.tracks().len(), 1);
    }

    #[test]
    fn tempo_out_of_range_is_rejected_without_mutation() {
        let mut timeline = sample_timeline();
        let before = timeline.clone();
        assert_eq!(
            set_tempo(&mut timeline, 301.0),
            Err(ValidationError::BpmOutOfRange(301.0))
        );
        assert!(set_tempo(&mut timeline, 0.5).is_err());
        assert!(set_tempo(&mut timeline, f64::NAN).is_err());
        assert_eq!(timeline, before);
    }

    #[test]
    fn instrument_replaces_first_matching_program_change() {
        let mut timeline = sample_timeline();
        set_instrument(&mut timeline, 1, 0, 40).unwrap();

        let programs: Vec<u8> = timeline.tracks()[1]
            .events
            .iter()
            .filter_map(|e| match e {
                TimelineEvent::ProgramChange { program, .. } => Some(*program),
                _ => None,
            })
            .collect();
        assert_eq!(programs, vec![40]);
    }

    #[test]
    fn instrument_inserted_at_tick_zero_when_missing() {
        let mut timeline = sample_timeline();
        set_instrument(&mut timeline, 2, 1, 33).unwrap();

        let bass = &timeline.tracks()[2];
        // track name meta stays first
        assert!(matches!(bass.events[0], TimelineEvent::Meta { .. }));
        assert_eq!(
            bass.events[1],
            TimelineEvent::ProgramChange {
                tick: 0,
                channel: 1,
                program: 33
            }
        );
        assert_eq!(timeline.program_at(1, 0), 33);
    }

    #[test]
    fn instrument_200_is_rejected_not_clamped() {
        let mut timeline = sample_timeline();
        let before = timeline.clone();
        assert_eq!(
            set_instrument(&mut timeline, 1, 0, 200),
            Err(ValidationError::InstrumentOutOfRange(200))
        );
        assert_eq!(timeline, before);
    }

    #[test]
    fn bad_channel_and_track_are_rejected() {
        let mut timeline = sample_timeline();
        assert_eq!(
            set_instrument(&mut timeline, 1, 16, 0),
            Err(ValidationError::ChannelOutOfRange(16))
        );
        assert_eq!(
            set_instrument(&mut timeline, 9, 0, 0),
            Err(ValidationError::TrackNotFound {
                index: 9,
                track_count: 3
            })
        );
    }

    #[test]
    fn batch_change_is_all_or_nothing() {
        let mut timeline = sample_timeline();
        let before = timeline.clone();

        let bad = [
            InstrumentChange {
                track: 1,
                channel: 0,
                program: 10,
            },
            InstrumentChange {
                track: 5,
                channel: 0,
                program: 10,
            },
        ];
        assert!(set_instruments(&mut timeline, &bad).is_err());
        assert_eq!(timeline, before);

        let good = [
            InstrumentChange {
                track: 1,
                channel: 0,
                program: 10,
            },
            InstrumentChange {
                track: 2,
                channel: 1,
                program: 34,
            },
        ];
        assert_eq!(set_instruments(&mut timeline, &good).unwrap(), 2);
        assert_eq!(timeline.program_at(0, 0), 10);
        assert_eq!(timeline.program_at(1, 0), 34);
    }
}
