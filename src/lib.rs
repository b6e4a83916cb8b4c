pub mod config;
pub mod dsp; // Signal primitives: envelope, oscillator, reverb
pub mod error;
pub mod io;
pub mod sequencing; // Note-event timelines, generation and editing
pub mod synth; // Voices, mixing and rendering
pub mod theory; // Chord parsing and music theory

pub use config::RenderConfig;
pub use error::{Error, Result, SynthError, ValidationError};
pub use io::StereoBuffer;
pub use sequencing::{
    generate, set_instrument, set_instruments, set_tempo, GenerationRequest, Generator, Style,
    Timeline,
};
pub use synth::SynthesisSession;
pub use theory::{resolve_progression, Key, Mode};

/// Output sample rate handed to encoders.
pub const SAMPLE_RATE: u32 = 44_100;
pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;

/// Generate a song from a request and render it with `config`.
///
/// Validation errors are returned; synthesis faults are absorbed into the
/// fallback tone.
pub fn render_request(request: &GenerationRequest, config: RenderConfig) -> Result<StereoBuffer> {
    let mut session = SynthesisSession::new(config)?;
    let song = Generator::new(session.config().ticks_per_quarter).generate(request)?;
    Ok(session.render(&song.timeline))
}
