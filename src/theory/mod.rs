//! Music theory: pitch classes, chords and progression parsing.
//!
//! This layer is pure and allocation-light. It knows nothing about ticks or
//! samples; the sequencer turns its output into timed note events.

/// Chord and progression types.
pub mod chord;
/// Pitch classes, keys and modes.
pub mod pitch;
/// Progression string → `ChordProgression`.
pub mod resolver;

pub use chord::{Chord, ChordProgression, ChordType};
pub use pitch::{Key, Mode};
pub use resolver::{resolve_progression, ChordResolver, ResolverConfig, TokenResolution};
