//! Instrument settings and General MIDI program families.

use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::envelope::Adsr;
use crate::dsp::harmonic::{Harmonic, WaveType, DEFAULT_PARTIALS};
use crate::dsp::lfo::{Vibrato, VibratoScale};

/// Everything a voice needs to know about how it sounds.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSettings {
    pub wave: WaveType,
    pub envelope: Adsr,
    pub harmonics: Vec<Harmonic>,
    pub vibrato: Vibrato,
}

impl InstrumentSettings {
    /// Settings using the preset harmonics of `wave`.
    pub fn new(wave: WaveType, envelope: Adsr) -> Self {
        Self {
            wave,
            envelope,
            harmonics: wave.harmonics(DEFAULT_PARTIALS),
            vibrato: Vibrato::OFF,
        }
    }

    pub fn with_harmonics(mut self, harmonics: Vec<Harmonic>) -> Self {
        self.wave = WaveType::Custom;
        self.harmonics = harmonics;
        self
    }

    pub fn with_vibrato(mut self, vibrato: Vibrato) -> Self {
        self.vibrato = vibrato;
        self
    }

    /// Default sound for a General MIDI program.
    pub fn for_program(program: u8) -> Self {
        let family = InstrumentFamily::from_program(program);
        let (wave, envelope, vibrato) = match family {
            InstrumentFamily::Keyboard => (WaveType::Triangle, Adsr::preset(0.005, 0.8, 0.25, 0.5), Vibrato::OFF),
            InstrumentFamily::Guitar => (WaveType::Sawtooth, Adsr::preset(0.003, 0.5, 0.2, 0.3), Vibrato::OFF),
            InstrumentFamily::Bass => (WaveType::Triangle, Adsr::preset(0.01, 0.3, 0.6, 0.15), Vibrato::OFF),
            InstrumentFamily::Strings => (
                WaveType::Sawtooth,
                Adsr::preset(0.12, 0.2, 0.85, 0.6),
                Vibrato::new(0.004, 5.0),
            ),
            InstrumentFamily::Vocal => (
                WaveType::Triangle,
                Adsr::preset(0.15, 0.2, 0.8, 0.7),
                Vibrato::new(0.004, 5.0),
            ),
            InstrumentFamily::Wind => (
                WaveType::Square,
                Adsr::preset(0.04, 0.1, 0.8, 0.2),
                Vibrato::new(0.003, 5.5),
            ),
            InstrumentFamily::Synth => (WaveType::Sawtooth, Adsr::preset(0.01, 0.1, 0.7, 0.2), Vibrato::OFF),
            InstrumentFamily::Pad => (
                WaveType::Triangle,
                Adsr::preset(0.6, 0.5, 0.8, 1.2),
                Vibrato::new(0.002, 4.0),
            ),
            InstrumentFamily::Effects => (WaveType::Sine, Adsr::preset(0.01, 0.3, 0.5, 0.5), Vibrato::OFF),
        };
        Self::new(wave, envelope).with_vibrato(vibrato)
    }

    /// Vibrato after applying the program family's coefficients.
    pub fn vibrato_for(&self, program: u8) -> Vibrato {
        self.vibrato
            .scaled(InstrumentFamily::from_program(program).vibrato_scale())
    }
}

impl Default for InstrumentSettings {
    fn default() -> Self {
        Self::for_program(0)
    }
}

/// General MIDI programs grouped by how they are played.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentFamily {
    /// Pianos, chromatic percussion, organs.
    Keyboard,
    Guitar,
    Bass,
    /// Bowed strings and string ensembles.
    Strings,
    /// Choirs and voices.
    Vocal,
    /// Brass, reeds, pipes.
    Wind,
    /// Synth leads.
    Synth,
    Pad,
    /// Orchestra hit, synth effects, ethnic, percussive, sound effects.
    Effects,
}

impl InstrumentFamily {
    pub fn from_program(program: u8) -> Self {
        match program {
            0..=23 => InstrumentFamily::Keyboard,
            24..=31 => InstrumentFamily::Guitar,
            32..=39 => InstrumentFamily::Bass,
            40..=51 => InstrumentFamily::Strings,
            52..=54 => InstrumentFamily::Vocal,
            56..=79 => InstrumentFamily::Wind,
            80..=87 => InstrumentFamily::Synth,
            88..=95 => InstrumentFamily::Pad,
            _ => InstrumentFamily::Effects,
        }
    }

    pub fn vibrato_scale(self) -> VibratoScale {
        match self {
            InstrumentFamily::Strings => VibratoScale {
                depth: 1.5,
                rate: 0.9,
            },
            InstrumentFamily::Vocal => VibratoScale {
                depth: 1.8,
                rate: 0.8,
            },
            _ => VibratoScale::UNITY,
        }
    }
}

/// Settings per program, built once and shared by every voice of a render.
pub struct InstrumentBank {
    programs: Vec<Option<Arc<InstrumentSettings>>>,
}

impl InstrumentBank {
    pub fn new() -> Self {
        Self {
            programs: vec![None; 128],
        }
    }

    /// Override the default settings for `program`.
    pub fn insert(&mut self, program: u8, settings: InstrumentSettings) {
        if let Some(slot) = self.programs.get_mut(program as usize) {
            *slot = Some(Arc::new(settings));
        }
    }

    pub fn get(&mut self, program: u8) -> Arc<InstrumentSettings> {
        let index = (program as usize).min(self.programs.len() - 1);
        self.programs[index]
            .get_or_insert_with(|| Arc::new(InstrumentSettings::for_program(program)))
            .clone()
    }
}

impl Default for InstrumentBank {
    fn default() -> Self {
        Self::new()
    }
}
