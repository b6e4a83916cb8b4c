// Purpose - outbound contracts: scheduled notes in, stereo samples out

pub mod converter;

pub use converter::{end_secs, schedule, ScheduledNote, TempoMap};

/// Rendered audio handed to an external encoder. Samples are in [-1, 1].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StereoBuffer {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub sample_rate: u32,
}

impl StereoBuffer {
    /// Duplicate a mono signal onto both channels.
    pub fn from_mono(mono: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            right: mono.clone(),
            left: mono,
            sample_rate,
        }
    }

    /// Frames (samples per channel).
    pub fn len(&self) -> usize {
        self.left.len().min(self.right.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(&self.right)
            .fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// L, R, L, R, ... as most encoders expect.
    pub fn interleaved(&self) -> Vec<f32> {
        self.left
            .iter()
            .zip(&self.right)
            .flat_map(|(&l, &r)| [l, r])
            .collect()
    }
}
