//! Error types.
//!
//! Two families: a [`ValidationError`] means the caller asked for something
//! out of range and no work was done; a [`SynthError`] is an internal
//! rendering fault that the mixer normally absorbs by substituting its
//! fallback tone.

use thiserror::Error;

/// Result type for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Input rejected before any mutation or rendering happened.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("bpm {0} is outside 1..=300")]
    BpmOutOfRange(f64),

    #[error("instrument {0} is outside 0..=127")]
    InstrumentOutOfRange(u32),

    #[error("channel {0} is outside 0..=15")]
    ChannelOutOfRange(u32),

    #[error("track {index} does not exist (timeline has {track_count} tracks)")]
    TrackNotFound { index: usize, track_count: usize },

    #[error("chord progression is empty")]
    EmptyProgression,

    #[error("none of the {0} chord tokens could be parsed")]
    NoParsableChords(usize),

    #[error("chord progression has {count} tokens, limit is {limit}")]
    TooManyChords { count: usize, limit: usize },

    #[error("invalid key '{0}'")]
    InvalidKey(String),

    #[error("invalid mode '{0}'")]
    InvalidMode(String),

    #[error("invalid time signature numerator {0}")]
    InvalidTimeSignature(u8),

    #[error("invalid reverb config: {0}")]
    InvalidReverbConfig(String),

    #[error("invalid sample rate {0}")]
    SampleRate(f32),

    #[error("{name} must be a non-negative finite time, got {value}")]
    NegativeTime { name: &'static str, value: f32 },

    #[error("invalid render config: {0}")]
    InvalidConfig(String),
}

/// Internal fault raised while producing samples.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    #[error("non-finite sample at frame {frame}")]
    NonFiniteSample { frame: usize },

    #[error("render of {secs:.1}s exceeds the {limit:.1}s limit")]
    RenderTooLong { secs: f64, limit: f64 },

    #[error("render produced no samples")]
    EmptyRender,
}

/// Crate-level error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Synth(#[from] SynthError),
}

impl Error {
    /// True for caller mistakes, false for internal faults.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
