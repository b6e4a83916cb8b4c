//! Pitch classes, keys and modes.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Semitones per octave.
pub const OCTAVE: i32 = 12;

const NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Wrap any semitone offset into a pitch class (0-11).
#[inline]
pub fn wrap_pitch_class(semitones: i32) -> u8 {
    semitones.rem_euclid(OCTAVE) as u8
}

/// Sharp-spelled name of a pitch class.
pub fn pitch_class_name(pc: u8) -> &'static str {
    NAMES[(pc % 12) as usize]
}

/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Parse a leading note name (`C`, `F#`, `Bb`) off the front of `input`.
///
/// Only uppercase letters are accepted so that lowercase roman numerals and
/// quality suffixes never collide with note names. Returns the pitch class
/// and the unparsed remainder.
pub fn split_note_name(input: &str) -> Option<(u8, &str)> {
    let mut chars = input.chars();
    let base: i32 = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = &input[1..];
    let (accidental, rest) = if let Some(r) = rest.strip_prefix('#') {
        (1, r)
    } else if let Some(r) = rest.strip_prefix('♯') {
        (1, r)
    } else if let Some(r) = rest.strip_prefix('♭') {
        (-1, r)
    } else if let Some(r) = rest.strip_prefix('b') {
        (-1, r)
    } else {
        (0, rest)
    };

    Some((wrap_pitch_class(base + accidental), rest))
}

/// Major or natural minor.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

impl Mode {
    /// Semitone offset of each scale degree from the tonic.
    pub const fn scale_intervals(self) -> [u8; 7] {
        match self {
            Mode::Major => [0, 2, 4, 5, 7, 9, 11],
            Mode::Minor => [0, 2, 3, 5, 7, 8, 10],
        }
    }
}

impl FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" | "maj" | "ionian" => Ok(Mode::Major),
            "minor" | "min" | "aeolian" => Ok(Mode::Minor),
            _ => Err(ValidationError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Major => f.write_str("major"),
            Mode::Minor => f.write_str("minor"),
        }
    }
}

/// Tonic pitch class of a key.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Key(u8);

impl Key {
    pub const C: Key = Key(0);

    /// Any integer is accepted and wrapped into 0-11.
    pub fn new(pitch_class: i32) -> Self {
        Key(wrap_pitch_class(pitch_class))
    }

    pub fn pitch_class(self) -> u8 {
        self.0
    }

    /// Pitch class of a 1-based scale degree in `mode`.
    pub fn degree(self, degree: u8, mode: Mode) -> u8 {
        let idx = (degree.clamp(1, 7) - 1) as usize;
        wrap_pitch_class(self.0 as i32 + mode.scale_intervals()[idx] as i32)
    }
}

impl FromStr for Key {
    type Err = ValidationError;

    /// Accepts note names in either case (`"c#"`, `"Bb"`) or a pitch-class
    /// number (`"7"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(pc) = trimmed.parse::<i32>() {
            return Ok(Key::new(pc));
        }

        let mut normalized = String::with_capacity(trimmed.len());
        let mut chars = trimmed.chars();
        if let Some(first) = chars.next() {
            normalized.push(first.to_ascii_uppercase());
            normalized.extend(chars);
        }

        match split_note_name(&normalized) {
            Some((pc, "")) => Ok(Key(pc)),
            _ => Err(ValidationError::InvalidKey(s.to_string())),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(pitch_class_name(self.0))
    }
}
