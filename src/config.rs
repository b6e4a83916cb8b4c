//! Render settings.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::reverb::ReverbConfig;
use crate::error::ValidationError;
use crate::sequencing::timeline::DEFAULT_TICKS_PER_QUARTER;
use crate::synth::mixer::DEFAULT_HEADROOM;
use crate::SAMPLE_RATE;

/// Everything a synthesis session needs besides the timeline itself.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub sample_rate: u32,
    pub ticks_per_quarter: u16,
    /// Gain applied after summing voices.
    pub headroom: f32,
    /// `None` renders dry.
    pub reverb: Option<ReverbConfig>,
    /// Seed for velocity humanization.
    pub seed: u64,
    /// Velocity jitter, as a fraction of full scale (0 disables it).
    pub humanize: f32,
    pub max_duration_secs: f64,
    /// Voice count above which voices render on the rayon pool.
    pub parallel_threshold: usize,
    /// Extra time after the last note-off for release and reverb tails.
    pub tail_secs: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            ticks_per_quarter: DEFAULT_TICKS_PER_QUARTER,
            headroom: DEFAULT_HEADROOM,
            reverb: Some(ReverbConfig::small_room()),
            seed: 0,
            humanize: 0.0,
            max_duration_secs: 600.0,
            parallel_threshold: 8,
            tail_secs: 1.5,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(8_000..=192_000).contains(&self.sample_rate) {
            return Err(ValidationError::SampleRate(self.sample_rate as f32));
        }
        if self.ticks_per_quarter == 0 {
            return Err(ValidationError::InvalidConfig(
                "ticks_per_quarter must be positive".into(),
            ));
        }
        if !self.headroom.is_finite() || self.headroom <= 0.0 || self.headroom > 1.0 {
            return Err(ValidationError::InvalidConfig(format!(
                "headroom {} outside (0, 1]",
                self.headroom
            )));
        }
        if !(0.0..=1.0).contains(&self.humanize) {
            return Err(ValidationError::InvalidConfig(format!(
                "humanize {} outside [0, 1]",
                self.humanize
            )));
        }
        if !self.max_duration_secs.is_finite() || self.max_duration_secs <= 0.0 {
            return Err(ValidationError::InvalidConfig(format!(
                "max_duration_secs {} must be positive",
                self.max_duration_secs
            )));
        }
        if !self.tail_secs.is_finite() || self.tail_secs < 0.0 {
            return Err(ValidationError::NegativeTime {
                name: "tail_secs",
                value: self.tail_secs,
            });
        }
        if let Some(reverb) = &self.reverb {
            reverb.validate()?;
        }
        Ok(())
    }

    pub fn dry(mut self) -> Self {
        self.reverb = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = RenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.headroom, 0.8);
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        let bad = [
            RenderConfig {
                sample_rate: 100,
                ..Default::default()
            },
            RenderConfig {
                headroom: 1.5,
                ..Default::default()
            },
            RenderConfig {
                humanize: -0.1,
                ..Default::default()
            },
            RenderConfig {
                tail_secs: -1.0,
                ..Default::default()
            },
            RenderConfig {
                reverb: Some(ReverbConfig {
                    decays: vec![],
                    ..ReverbConfig::small_room()
                }),
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn dry_drops_reverb() {
        assert!(RenderConfig::default().dry().reverb.is_none());
    }
}
