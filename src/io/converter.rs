//! Timeline → seconds.
//!
//! Ticks become seconds through the tempo map: each tempo event starts a
//! segment where one quarter note lasts `micros_per_quarter` microseconds.

use crate::sequencing::timeline::{micros_per_quarter, Timeline, TimelineEvent, DEFAULT_BPM};

/// A note placed in absolute time with the program active on its channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledNote {
    pub pitch: u8,
    pub velocity: u8,
    pub channel: u8,
    pub program: u8,
    pub start_secs: f64,
    pub duration_secs: f64,
}

impl ScheduledNote {
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    tick: u32,
    start_secs: f64,
    secs_per_tick: f64,
}

#[derive(Debug, Clone)]
pub struct TempoMap {
    segments: Vec<Segment>,
}

impl TempoMap {
    /// Without tempo events the timeline plays at 120 bpm.
    pub fn from_timeline(timeline: &Timeline) -> Self {
        let tpq = timeline.ticks_per_quarter().max(1) as f64;
        let secs_per_tick = |micros: u32| micros as f64 / 1_000_000.0 / tpq;

        let mut segments = vec![Segment {
            tick: 0,
            start_secs: 0.0,
            secs_per_tick: secs_per_tick(micros_per_quarter(DEFAULT_BPM)),
        }];

        for (tick, micros) in timeline.tempo_map() {
            let last = segments[segments.len() - 1];
            let segment = Segment {
                tick,
                start_secs: last.start_secs + (tick - last.tick) as f64 * last.secs_per_tick,
                secs_per_tick: secs_per_tick(micros),
            };
            if tick == last.tick {
                // a later event at the same tick wins
                let end = segments.len() - 1;
                segments[end] = segment;
            } else {
                segments.push(segment);
            }
        }

        Self { segments }
    }

    pub fn seconds_at(&self, tick: u32) -> f64 {
        let index = self.segments.partition_point(|s| s.tick <= tick).saturating_sub(1);
        let segment = self.segments[index];
        segment.start_secs + (tick - segment.tick) as f64 * segment.secs_per_tick
    }
}

/// Program changes per channel, sorted by tick.
#[derive(Debug, Clone, Default)]
struct ProgramMap {
    channels: [Vec<(u32, u8)>; 16],
}

impl ProgramMap {
    fn from_timeline(timeline: &Timeline) -> Self {
        let mut map = Self::default();
        for event in timeline.tracks().iter().flat_map(|t| t.events.iter()) {
            if let TimelineEvent::ProgramChange {
                tick,
                channel,
                program,
            } = *event
            {
                if let Some(changes) = map.channels.get_mut(channel as usize) {
                    changes.push((tick, program));
                }
            }
        }
        for changes in &mut map.channels {
            changes.sort_by_key(|(tick, _)| *tick);
        }
        map
    }

    /// Same answer as [`Timeline::program_at`], in O(log n).
    fn program_at(&self, channel: u8, tick: u32) -> u8 {
        let Some(changes) = self.channels.get(channel as usize) else {
            return 0;
        };
        match changes.partition_point(|(at, _)| *at <= tick) {
            0 => 0,
            n => changes[n - 1].1,
        }
    }
}

/// Seconds until the last note-off.
pub fn end_secs(timeline: &Timeline) -> f64 {
    TempoMap::from_timeline(timeline).seconds_at(timeline.end_tick())
}

/// Every note of the timeline in seconds, ordered by start time.
pub fn schedule(timeline: &Timeline) -> Vec<ScheduledNote> {
    let tempo = TempoMap::from_timeline(timeline);
    let programs = ProgramMap::from_timeline(timeline);

    let mut notes: Vec<ScheduledNote> = timeline
        .note_events()
        .filter(|n| n.duration_ticks > 0)
        .map(|n| {
            let start_secs = tempo.seconds_at(n.start_tick);
            ScheduledNote {
                pitch: n.pitch,
                velocity: n.velocity,
                channel: n.channel,
                program: programs.program_at(n.channel, n.start_tick),
                start_secs,
                duration_secs: tempo.seconds_at(n.end_tick()) - start_secs,
            }
        })
        .collect();

    notes.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));
    notes
}
