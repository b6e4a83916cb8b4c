// Purpose: Note-event timelines, generation from chords, and timeline edits

pub mod editor;
pub mod generator;
pub mod pattern;
pub mod time_signature;
pub mod timeline;

pub use editor::{set_instrument, set_instruments, set_tempo, InstrumentChange};
pub use generator::{generate, GeneratedSong, GenerationRequest, Generator, Instrumentation};
pub use pattern::{PerformancePattern, Style};
pub use time_signature::TimeSignature;
pub use timeline::{MetaEvent, NoteEvent, Timeline, TimelineEvent, Track};
