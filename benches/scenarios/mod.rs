//! Real-world scenario benchmarks.
//!
//! Single voices and the live synth per block, and whole songs rendered
//! offline through a session.

mod render;
mod voices;

pub use render::bench_render;
pub use voices::bench_voices;
