use super::timeline::MetaEvent;
use crate::error::ValidationError;

/// Time signature (numerator / denominator)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    /// Number of beats per bar (numerator)
    pub numerator: u8,
    /// Note value that gets one beat (denominator: 4 = quarter, 8 = eighth)
    pub denominator: u8,
}

impl TimeSignature {
    /// Standard 4/4 time
    pub const FOUR_FOUR: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };

    /// 3/4 time (waltz)
    pub const THREE_FOUR: TimeSignature = TimeSignature {
        numerator: 3,
        denominator: 4,
    };

    /// 6/8 time (compound duple meter)
    pub const SIX_EIGHT: TimeSignature = TimeSignature {
        numerator: 6,
        denominator: 8,
    };

    pub fn new(numerator: u8, denominator: u8) -> Result<Self, ValidationError> {
        if numerator == 0 || numerator > 32 {
            return Err(ValidationError::InvalidTimeSignature(numerator));
        }
        if !matches!(denominator, 1 | 2 | 4 | 8 | 16 | 32) {
            return Err(ValidationError::InvalidConfig(format!(
                "time signature denominator {denominator} is not a power of two"
            )));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Quarter-note meter with the given number of beats per bar.
    pub fn quarters(numerator: u8) -> Result<Self, ValidationError> {
        Self::new(numerator, 4)
    }

    /// Get the total duration of one bar in ticks
    /// Formula: (numerator / denominator) * (4 * ppq)
    ///        = (numerator * 4 * ppq) / denominator
    pub fn bar_ticks(&self, ppq: u32) -> u32 {
        (self.numerator as u32 * 4 * ppq) / self.denominator as u32
    }

    /// Duration of one beat (the denominator's note value) in ticks.
    pub fn beat_ticks(&self, ppq: u32) -> u32 {
        (4 * ppq) / self.denominator as u32
    }

    pub fn to_meta(self) -> MetaEvent {
        MetaEvent::TimeSignature {
            numerator: self.numerator,
            denominator: self.denominator,
        }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::FOUR_FOUR
    }
}
