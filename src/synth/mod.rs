// Purpose: Instruments, voices, mixing, and the offline/live renderers
// This layer sits above the dsp primitives and owns voice lifecycles

pub mod instrument;
pub mod message;
pub mod mixer;
pub mod poly;
pub mod session;
pub mod voice;

pub use instrument::{InstrumentBank, InstrumentFamily, InstrumentSettings};
pub use message::{MessageReceiver, SynthMessage};
pub use mixer::{fallback_tone, Mixer};
pub use poly::PolySynth;
pub use session::SynthesisSession;
pub use voice::{Voice, VoiceState};
