/*
Chord Progression Resolution
============================

Turns a progression string such as

    "I-vi-IV-V"          roman numerals, relative to the key
    "C G(2) Am(2) F"     absolute note names with optional beat durations
    "ii7, V7, Imaj7"     mixed separators and quality suffixes

into a `ChordProgression`.

Tokens
------

Separators are hyphen, space, comma and bar line. A parenthesized duration
that got split off by a space ("V (2)") is glued back onto the token before it.

Each token is either

  ROMAN      I II III IV V VI VII   uppercase = major quality
             i ii iii iv v vi vii   lowercase = minor quality

  ABSOLUTE   A-G, optional # or b

followed by an optional quality suffix (m, dim, °, o, aug, +, 7, maj) and an
optional "(beats)".

Roman degree → root pitch class goes through the mode's 7-entry interval table:

    major  [0, 2, 4, 5, 7, 9, 11]
    minor  [0, 2, 3, 5, 7, 8, 10]

Failure Policy
--------------

A token that does not parse never aborts the request. It resolves to a
`TokenResolution::Defaulted` carrying a chord picked from its position in a
repeating I-IV-V-vi cycle, and a warning is logged. Only request-level
problems are errors: no tokens at all, every token defaulted, or more tokens
than the configured ceiling.

Long progressions are resolved in parallel. Every token is independent, so
each worker writes into its own pre-sized slot by index and order never
depends on completion order.
*/

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::chord::{Chord, ChordProgression, ChordType};
use super::pitch::{split_note_name, Key, Mode};
use crate::error::ValidationError;

const ROMAN_DEGREES: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// Degree and quality of the default chord at positions 0, 1, 2, 3 (mod 4).
const DEFAULT_CYCLE: [(u8, ChordType); 4] = [
    (1, ChordType::Major),
    (4, ChordType::Major),
    (5, ChordType::Major),
    (6, ChordType::Minor),
];

/// Longest chord duration accepted in a token.
const MAX_TOKEN_BEATS: f32 = 64.0;

/// Why a token was replaced by its default chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("not a roman numeral or note name")]
    UnknownSymbol,
    #[error("unrecognised chord quality")]
    UnknownQuality,
    #[error("malformed beat duration")]
    BadDuration,
}

/// Outcome of resolving one token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenResolution {
    Parsed(Chord),
    Defaulted { chord: Chord, reason: TokenError },
}

impl TokenResolution {
    pub fn chord(&self) -> Chord {
        match self {
            TokenResolution::Parsed(chord) | TokenResolution::Defaulted { chord, .. } => *chord,
        }
    }

    pub fn used_default(&self) -> bool {
        matches!(self, TokenResolution::Defaulted { .. })
    }
}

/// Limits applied to a whole progression request.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverConfig {
    /// Token ceiling; longer progressions are rejected.
    pub max_tokens: usize,
    /// Above this many tokens, resolution runs on the rayon pool.
    pub parallel_threshold: usize,
    /// Time signature numerator stored on the progression.
    pub beats_per_bar: u8,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_tokens: 128,
            parallel_threshold: 16,
            beats_per_bar: 4,
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidConfig(
                "max_tokens must be at least 1".into(),
            ));
        }
        if !(1..=32).contains(&self.beats_per_bar) {
            return Err(ValidationError::InvalidTimeSignature(self.beats_per_bar));
        }
        Ok(())
    }
}

/// Split a progression string into chord tokens.
pub fn tokenize(input: &str) -> Vec<&str> {
    let is_separator = |c: char| matches!(c, '-' | ',' | '|') || c.is_whitespace();

    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut start: Option<usize> = None;
    let mut depth = 0usize;
    for (idx, c) in input.char_indices().chain([(input.len(), ' ')]) {
        match c {
            // an unclosed "(" does not swallow the tokens after it
            '(' if input[idx..].contains(')') => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        // separators inside a duration belong to it
        if is_separator(c) && (depth == 0 || idx == input.len()) {
            if let Some(s) = start.take() {
                // A bare "(n)" belongs to the token before it
                match spans.last_mut() {
                    Some(prev) if input[s..].starts_with('(') => prev.1 = idx,
                    _ => spans.push((s, idx)),
                }
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }

    spans.into_iter().map(|(s, e)| &input[s..e]).collect()
}

/// Resolve a single token at `position` without failing.
pub fn resolve_token(token: &str, position: usize, key: Key, mode: Mode) -> TokenResolution {
    let (symbol, beats) = match split_duration(token) {
        Ok(parts) => parts,
        Err(reason) => {
            return TokenResolution::Defaulted {
                chord: default_chord(position, key, mode, Chord::DEFAULT_BEATS),
                reason,
            }
        }
    };

    match parse_symbol(symbol, key, mode) {
        Ok((root, chord_type)) => TokenResolution::Parsed(Chord::new(root, chord_type, beats)),
        Err(reason) => TokenResolution::Defaulted {
            chord: default_chord(position, key, mode, beats),
            reason,
        },
    }
}

/// Deterministic stand-in chord for an unparseable token.
pub fn default_chord(position: usize, key: Key, mode: Mode, beats: f32) -> Chord {
    let (degree, chord_type) = DEFAULT_CYCLE[position % DEFAULT_CYCLE.len()];
    Chord::new(key.degree(degree, mode), chord_type, beats)
}

fn split_duration(token: &str) -> Result<(&str, f32), TokenError> {
    let Some(open) = token.find('(') else {
        return Ok((token.trim(), Chord::DEFAULT_BEATS));
    };

    let inner = token[open + 1..]
        .strip_suffix(')')
        .ok_or(TokenError::BadDuration)?;
    let beats: f32 = inner.trim().parse().map_err(|_| TokenError::BadDuration)?;
    if !beats.is_finite() || beats <= 0.0 || beats > MAX_TOKEN_BEATS {
        return Err(TokenError::BadDuration);
    }

    Ok((token[..open].trim(), beats))
}

fn parse_symbol(symbol: &str, key: Key, mode: Mode) -> Result<(u8, ChordType), TokenError> {
    if let Some((degree, base, suffix)) = split_roman(symbol) {
        let root = key.degree(degree, mode);
        return Ok((root, quality(base, suffix)?));
    }

    if let Some((root, suffix)) = split_note_name(symbol) {
        return Ok((root, quality(ChordType::Major, suffix)?));
    }

    Err(TokenError::UnknownSymbol)
}

/// Leading roman numeral → (degree 1-7, case quality, remainder).
fn split_roman(symbol: &str) -> Option<(u8, ChordType, &str)> {
    let len = symbol
        .char_indices()
        .find(|(_, c)| !matches!(c, 'I' | 'V' | 'i' | 'v'))
        .map_or(symbol.len(), |(idx, _)| idx);
    if len == 0 {
        return None;
    }

    let numeral = &symbol[..len];
    let base = if numeral.chars().all(|c| c.is_ascii_uppercase()) {
        ChordType::Major
    } else if numeral.chars().all(|c| c.is_ascii_lowercase()) {
        ChordType::Minor
    } else {
        return None;
    };

    let upper = numeral.to_ascii_uppercase();
    let degree = ROMAN_DEGREES.iter().position(|r| *r == upper)? as u8 + 1;

    Some((degree, base, &symbol[len..]))
}

fn quality(base: ChordType, suffix: &str) -> Result<ChordType, TokenError> {
    let chord_type = match suffix {
        "" => base,
        "m" | "min" | "m7" | "min7" => ChordType::Minor,
        "M" | "maj" | "M7" | "maj7" => ChordType::Major,
        "dim" | "°" | "o" => ChordType::Diminished,
        "aug" | "+" => ChordType::Augmented,
        // ii7 keeps its minor triad; only major-quality chords become dominant sevenths
        "7" | "dom7" if base == ChordType::Minor => ChordType::Minor,
        "7" | "dom7" => ChordType::Seventh,
        _ => return Err(TokenError::UnknownQuality),
    };
    Ok(chord_type)
}

/// Resolves progression strings under a fixed [`ResolverConfig`].
#[derive(Debug, Clone, Default)]
pub struct ChordResolver {
    config: ResolverConfig,
}

impl ChordResolver {
    pub fn new(config: ResolverConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn resolve(
        &self,
        input: &str,
        key: Key,
        mode: Mode,
    ) -> Result<ChordProgression, ValidationError> {
        let tokens = tokenize(input);
        if tokens.is_empty() {
            return Err(ValidationError::EmptyProgression);
        }
        if tokens.len() > self.config.max_tokens {
            return Err(ValidationError::TooManyChords {
                count: tokens.len(),
                limit: self.config.max_tokens,
            });
        }

        let mut slots: Vec<Option<TokenResolution>> = vec![None; tokens.len()];
        if tokens.len() > self.config.parallel_threshold {
            slots.par_iter_mut().enumerate().for_each(|(idx, slot)| {
                *slot = Some(resolve_token(tokens[idx], idx, key, mode));
            });
        } else {
            for (idx, slot) in slots.iter_mut().enumerate() {
                *slot = Some(resolve_token(tokens[idx], idx, key, mode));
            }
        }

        let mut chords = Vec::with_capacity(tokens.len());
        let mut defaulted = Vec::new();
        for (idx, resolution) in slots.into_iter().flatten().enumerate() {
            if let TokenResolution::Defaulted { chord, reason } = resolution {
                warn!(
                    position = idx,
                    token = tokens[idx],
                    %reason,
                    substitute = %chord,
                    "chord token replaced by default"
                );
                defaulted.push(idx);
            }
            chords.push(resolution.chord());
        }

        if defaulted.len() == tokens.len() {
            return Err(ValidationError::NoParsableChords(tokens.len()));
        }

        debug!(
            chords = chords.len(),
            defaulted = defaulted.len(),
            %key,
            %mode,
            "resolved chord progression"
        );

        Ok(ChordProgression::new(key, mode, self.config.beats_per_bar, chords)
            .with_defaulted(defaulted))
    }
}

/// Resolve with the default limits.
pub fn resolve_progression(
    input: &str,
    key: Key,
    mode: Mode,
) -> Result<ChordProgression, ValidationError> {
    ChordResolver::default().resolve(input, key, mode)
}
