//! Generation mode: chord progression + style → note-event timeline.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::editor::validate_bpm;
use super::pattern::{PerformancePattern, Span, Style};
use super::time_signature::TimeSignature;
use super::timeline::{micros_per_quarter, MetaEvent, Timeline, TimelineEvent, Track};
use crate::error::ValidationError;
use crate::theory::{Chord, ChordProgression, ChordResolver, Key, Mode, ResolverConfig};

/// Lowest MIDI note a chord root is voiced on (G3); roots span G3..F#4.
const CHORD_ROOT_LOW: u8 = 55;
const CHORD_ROOT_LOW_PC: i32 = 7;

pub const CHORD_CHANNEL: u8 = 0;
pub const BASS_CHANNEL: u8 = 1;

/// Which parts to generate.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrumentation {
    pub chords: bool,
    pub bass: bool,
}

impl Default for Instrumentation {
    fn default() -> Self {
        Self {
            chords: true,
            bass: true,
        }
    }
}

/// Parameters handed in by the request layer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub style: Style,
    pub progression: String,
    pub key: Key,
    pub mode: Mode,
    pub bpm: f64,
    pub beats_per_bar: u8,
    pub instrumentation: Instrumentation,
}

impl GenerationRequest {
    pub fn new(progression: impl Into<String>, key: Key, mode: Mode) -> Self {
        Self {
            style: Style::default(),
            progression: progression.into(),
            key,
            mode,
            bpm: 120.0,
            beats_per_bar: 4,
            instrumentation: Instrumentation::default(),
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn beats_per_bar(mut self, beats_per_bar: u8) -> Self {
        self.beats_per_bar = beats_per_bar;
        self
    }

    pub fn instrumentation(mut self, instrumentation: Instrumentation) -> Self {
        self.instrumentation = instrumentation;
        self
    }
}

/// Generated song: the resolved chords plus their event timeline.
#[derive(Debug, Clone)]
pub struct GeneratedSong {
    pub progression: ChordProgression,
    pub timeline: Timeline,
    pub micros_per_quarter: u32,
}

/// Expands chord progressions into timelines.
#[derive(Debug, Clone)]
pub struct Generator {
    resolver_config: ResolverConfig,
    ticks_per_quarter: u16,
}

impl Generator {
    pub fn new(ticks_per_quarter: u16) -> Self {
        Self {
            resolver_config: ResolverConfig::default(),
            ticks_per_quarter: ticks_per_quarter.max(1),
        }
    }

    pub fn with_resolver_config(mut self, config: ResolverConfig) -> Self {
        self.resolver_config = config;
        self
    }

    pub fn generate(&self, request: &GenerationRequest) -> Result<GeneratedSong, ValidationError> {
        validate_bpm(request.bpm)?;
        let time_signature = TimeSignature::quarters(request.beats_per_bar)?;
        if !request.instrumentation.chords && !request.instrumentation.bass {
            return Err(ValidationError::InvalidConfig(
                "instrumentation selects no parts".into(),
            ));
        }

        let resolver = ChordResolver::new(ResolverConfig {
            beats_per_bar: request.beats_per_bar,
            ..self.resolver_config
        })?;
        let progression = resolver.resolve(&request.progression, request.key, request.mode)?;
        let timeline = self.expand(&progression, request, time_signature);
        let micros = micros_per_quarter(request.bpm);

        debug!(
            style = %request.style,
            chords = progression.len(),
            notes = timeline.note_events().count(),
            end_tick = timeline.end_tick(),
            "generated timeline"
        );

        Ok(GeneratedSong {
            progression,
            timeline,
            micros_per_quarter: micros,
        })
    }

    /// Lay a resolved progression out as conductor, chord and bass tracks.
    pub fn expand(
        &self,
        progression: &ChordProgression,
        request: &GenerationRequest,
        time_signature: TimeSignature,
    ) -> Timeline {
        let tpq = self.ticks_per_quarter as u32;
        let mut timeline = Timeline::new(self.ticks_per_quarter);

        let mut conductor = Track::named("conductor");
        conductor.push(TimelineEvent::Meta {
            tick: 0,
            meta: MetaEvent::Tempo {
                micros_per_quarter: micros_per_quarter(request.bpm),
            },
        });
        conductor.push(TimelineEvent::Meta {
            tick: 0,
            meta: time_signature.to_meta(),
        });
        timeline.push_track(conductor);

        let style = request.style;
        let spans: Vec<(Span, &Chord)> = progression
            .iter_with_start_beats()
            .map(|(start_beat, chord)| {
                let start_tick = beats_to_ticks(start_beat, tpq);
                let end_tick = beats_to_ticks(start_beat + chord.duration_beats(), tpq);
                let span = Span {
                    start_tick,
                    length_ticks: end_tick.saturating_sub(start_tick),
                    beat_ticks: time_signature.beat_ticks(tpq),
                    velocity: style.velocity(),
                    channel: CHORD_CHANNEL,
                };
                (span, chord)
            })
            .collect();

        if request.instrumentation.chords {
            let mut track = part_track("chords", CHORD_CHANNEL, style.chord_program());
            let pattern = style.pattern();
            for (span, chord) in &spans {
                let pitches = voicing(chord);
                track
                    .events
                    .extend(pattern.expand(&pitches, *span).into_iter().map(TimelineEvent::Note));
            }
            track.sort();
            timeline.push_track(track);
        }

        if request.instrumentation.bass {
            let mut track = part_track("bass", BASS_CHANNEL, style.bass_program());
            for (span, chord) in &spans {
                let bass_span = Span {
                    channel: BASS_CHANNEL,
                    velocity: style.velocity().saturating_add(10).min(127),
                    ..*span
                };
                let root = [root_note(chord) - 24];
                track.events.extend(
                    PerformancePattern::Block
                        .expand(&root, bass_span)
                        .into_iter()
                        .map(TimelineEvent::Note),
                );
            }
            track.sort();
            timeline.push_track(track);
        }

        timeline
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(super::timeline::DEFAULT_TICKS_PER_QUARTER)
    }
}

fn part_track(name: &str, channel: u8, program: u8) -> Track {
    let mut track = Track::named(name);
    track.push(TimelineEvent::ProgramChange {
        tick: 0,
        channel,
        program,
    });
    track
}

fn beats_to_ticks(beats: f32, ticks_per_quarter: u32) -> u32 {
    (beats as f64 * ticks_per_quarter as f64).round() as u32
}

fn root_note(chord: &Chord) -> u8 {
    CHORD_ROOT_LOW + (chord.root() as i32 - CHORD_ROOT_LOW_PC).rem_euclid(12) as u8
}

/// Close-position voicing, root lowest.
pub fn voicing(chord: &Chord) -> Vec<u8> {
    let root = root_note(chord);
    chord.intervals().map(|i| root + i).collect()
}

/// Resolve and expand in one call with default settings.
pub fn generate(request: &GenerationRequest) -> Result<GeneratedSong, ValidationError> {
    Generator::default().generate(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::ChordType;

    fn request(progression: &str) -> GenerationRequest {
        GenerationRequest::new(progression, Key::C, Mode::Major)
    }

    #[test]
    fn resolver_limits_apply_to_generation() {
        let generator = Generator::new(480).with_resolver_config(ResolverConfig {
            max_tokens: 2,
            ..ResolverConfig::default()
        });
        assert_eq!(
            generator.generate(&request("I-IV-V")).unwrap_err(),
            ValidationError::TooManyChords { count: 3, limit: 2 }
        );
        assert!(generator.generate(&request("I-V")).is_ok());
    }

    #[test]
    fn voicing_stacks_intervals_on_root() {
        let c = Chord::new(0, ChordType::Major, 4.0);
        assert_eq!(voicing(&c), vec![60, 64, 67]);

        let g7 = Chord::new(7, ChordType::Seventh, 4.0);
        assert_eq!(voicing(&g7), vec![55, 59, 62, 65]);

        let f_sharp = Chord::new(6, ChordType::Minor, 4.0);
        assert_eq!(voicing(&f_sharp)[0], 66);
    }

    #[test]
    fn block_style_places_chords_on_beat_boundaries() {
        let song = generate(&request("I-IV(2)-V(2)").style(Style::Classical)).unwrap();
        let chords = song.timeline.track(1).unwrap();

        let starts: Vec<u32> = chords.notes().map(|n| n.start_tick).collect();
        assert_eq!(starts, vec![0, 0, 0, 1920, 1920, 1920, 2880, 2880, 2880]);
        assert_eq!(song.timeline.end_tick(), 3840);
    }

    #[test]
    fn conductor_track_carries_tempo_and_meter() {
        let song = generate(&request("I-V").bpm(90.0).beats_per_bar(3)).unwrap();
        assert_eq!(song.micros_per_quarter, 666_667);
        assert_eq!(song.timeline.tempo_map(), vec![(0, 666_667)]);

        let conductor = song.timeline.track(0).unwrap();
        assert!(conductor.events.iter().any(|e| matches!(
            e,
            TimelineEvent::Meta {
                meta: MetaEvent::TimeSignature { numerator: 3, denominator: 4 },
                ..
            }
        )));
        assert_eq!(song.progression.beats_per_bar(), 3);
    }

    #[test]
    fn bass_follows_chord_roots_on_its_own_channel() {
        let song = generate(&request("I-vi-IV-V")).unwrap();
        let bass = song.timeline.track(2).unwrap();
        let pitches: Vec<u8> = bass.notes().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![36, 33, 41, 31]);
        assert!(bass.notes().all(|n| n.channel == BASS_CHANNEL));
        assert_eq!(song.timeline.program_at(BASS_CHANNEL, 0), Style::Pop.bass_program());
    }

    #[test]
    fn instrumentation_flags_select_tracks() {
        let only_chords = Instrumentation {
            chords: true,
            bass: false,
        };
        let song = generate(&request("I-V").instrumentation(only_chords)).unwrap();
        assert_eq!(song.timeline.tracks().len(), 2);

        let nothing = Instrumentation {
            chords: false,
            bass: false,
        };
        assert!(generate(&request("I-V").instrumentation(nothing)).is_err());
    }

    #[test]
    fn bpm_is_validated_before_resolution() {
        assert_eq!(
            generate(&request("I").bpm(0.0)).unwrap_err(),
            ValidationError::BpmOutOfRange(0.0)
        );
        assert!(generate(&request("I").bpm(301.0)).is_err());
    }

    #[test]
    fn generated_notes_are_in_midi_range() {
        for style in Style::ALL {
            let song = generate(&request("I-ii-iii-IV-V-vi-vii°").style(style)).unwrap();
            for note in song.timeline.note_events() {
                assert!(note.pitch <= 127);
                assert!(note.velocity <= 127);
                assert!(note.channel <= 15);
                assert!(note.duration_ticks > 0);
            }
        }
    }
}
