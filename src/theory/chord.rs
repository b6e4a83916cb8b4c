use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::pitch::{pitch_class_name, wrap_pitch_class, Key, Mode};

/// Chord quality.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordType {
    Major,
    Minor,
    Diminished,
    Augmented,
    /// Dominant seventh: major triad plus a minor seventh.
    Seventh,
}

impl ChordType {
    /// Minor-quality chords (minor, diminished) take a minor third.
    pub const fn third_interval(self) -> u8 {
        match self {
            ChordType::Minor | ChordType::Diminished => 3,
            _ => 4,
        }
    }

    pub const fn fifth_interval(self) -> u8 {
        match self {
            ChordType::Diminished => 6,
            ChordType::Augmented => 8,
            _ => 7,
        }
    }

    pub const fn seventh_interval(self) -> Option<u8> {
        match self {
            ChordType::Seventh => Some(10),
            _ => None,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            ChordType::Major => "",
            ChordType::Minor => "m",
            ChordType::Diminished => "dim",
            ChordType::Augmented => "aug",
            ChordType::Seventh => "7",
        }
    }
}

/// A triad (or seventh chord) expressed as pitch classes.
///
/// `third` and `fifth` are always `root + interval (mod 12)`; the fields are
/// private so the only way to build one is through [`Chord::new`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chord {
    root: u8,
    third: u8,
    fifth: u8,
    chord_type: ChordType,
    duration_beats: f32,
}

impl Chord {
    pub const DEFAULT_BEATS: f32 = 4.0;

    pub fn new(root: u8, chord_type: ChordType, duration_beats: f32) -> Self {
        let root = wrap_pitch_class(root as i32);
        Self {
            root,
            third: wrap_pitch_class(root as i32 + chord_type.third_interval() as i32),
            fifth: wrap_pitch_class(root as i32 + chord_type.fifth_interval() as i32),
            chord_type,
            duration_beats,
        }
    }

    pub fn root(&self) -> u8 {
        self.root
    }

    pub fn third(&self) -> u8 {
        self.third
    }

    pub fn fifth(&self) -> u8 {
        self.fifth
    }

    pub fn seventh(&self) -> Option<u8> {
        self.chord_type
            .seventh_interval()
            .map(|i| wrap_pitch_class(self.root as i32 + i as i32))
    }

    pub fn chord_type(&self) -> ChordType {
        self.chord_type
    }

    pub fn duration_beats(&self) -> f32 {
        self.duration_beats
    }

    /// Semitone offsets above the root, lowest first (0, third, fifth[, seventh]).
    pub fn intervals(&self) -> impl Iterator<Item = u8> {
        let t = self.chord_type;
        [Some(0), Some(t.third_interval()), Some(t.fifth_interval()), t.seventh_interval()]
            .into_iter()
            .flatten()
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}({})",
            pitch_class_name(self.root),
            self.chord_type.suffix(),
            self.duration_beats
        )
    }
}

/// An ordered list of chords in a key.
///
/// The per-chord beat durations are mirrored in a parallel list; both are
/// derived from the same `Vec<Chord>` at construction so their lengths can
/// never diverge.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ChordProgression {
    key: Key,
    mode: Mode,
    beats_per_bar: u8,
    chords: Vec<Chord>,
    durations: Vec<f32>,
    /// Positions whose token failed to parse and was replaced.
    defaulted: Vec<usize>,
}

impl ChordProgression {
    pub fn new(key: Key, mode: Mode, beats_per_bar: u8, chords: Vec<Chord>) -> Self {
        let durations = chords.iter().map(Chord::duration_beats).collect();
        Self {
            key,
            mode,
            beats_per_bar: beats_per_bar.max(1),
            chords,
            durations,
            defaulted: Vec::new(),
        }
    }

    pub(crate) fn with_defaulted(mut self, defaulted: Vec<usize>) -> Self {
        self.defaulted = defaulted;
        self
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Time signature numerator.
    pub fn beats_per_bar(&self) -> u8 {
        self.beats_per_bar
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn durations(&self) -> &[f32] {
        &self.durations
    }

    pub fn defaulted(&self) -> &[usize] {
        &self.defaulted
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn total_beats(&self) -> f32 {
        self.durations.iter().sum()
    }

    /// Chords paired with the beat position they start on.
    pub fn iter_with_start_beats(&self) -> impl Iterator<Item = (f32, &Chord)> {
        self.chords.iter().scan(0.0_f32, |beat, chord| {
            let start = *beat;
            *beat += chord.duration_beats();
            Some((start, chord))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_follow_quality() {
        let c = Chord::new(0, ChordType::Major, 4.0);
        assert_eq!((c.root(), c.third(), c.fifth()), (0, 4, 7));

        let a_min = Chord::new(9, ChordType::Minor, 4.0);
        assert_eq!((a_min.third(), a_min.fifth()), (0, 4));

        let b_dim = Chord::new(11, ChordType::Diminished, 4.0);
        assert_eq!((b_dim.third(), b_dim.fifth()), (2, 5));

        let c_aug = Chord::new(0, ChordType::Augmented, 4.0);
        assert_eq!(c_aug.fifth(), 8);
    }

    #[test]
    fn seventh_adds_minor_seventh() {
        let g7 = Chord::new(7, ChordType::Seventh, 4.0);
        assert_eq!(g7.seventh(), Some(5));
        assert_eq!(g7.intervals().collect::<Vec<_>>(), vec![0, 4, 7, 10]);
        assert_eq!(Chord::new(0, ChordType::Major, 4.0).seventh(), None);
    }

    #[test]
    fn progression_durations_mirror_chords() {
        let prog = ChordProgression::new(
            Key::C,
            Mode::Major,
            4,
            vec![
                Chord::new(0, ChordType::Major, 4.0),
                Chord::new(5, ChordType::Major, 2.0),
                Chord::new(7, ChordType::Major, 2.0),
            ],
        );

        assert_eq!(prog.chords().len(), prog.durations().len());
        assert_eq!(prog.durations(), &[4.0, 2.0, 2.0]);
        assert_eq!(prog.total_beats(), 8.0);

        let starts: Vec<f32> = prog.iter_with_start_beats().map(|(b, _)| b).collect();
        assert_eq!(starts, vec![0.0, 4.0, 6.0]);
    }

    #[test]
    fn display_uses_sharp_names() {
        assert_eq!(Chord::new(6, ChordType::Minor, 2.0).to_string(), "F#m(2)");
    }
}
