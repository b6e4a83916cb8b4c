//! Signal summing, gain and limiting primitives.

/*
Signal Mixing
=============

Mixing combines signals by ADDING them together. Every voice of a render is
summed into one buffer, so the result must be brought back into range before
it leaves the synthesizer.

Vocabulary
----------

  summing       Adding signals at equal levels (no weighting). Can cause
                clipping if signals are already near full scale.

  headroom      A fixed gain below 1.0 applied after summing, leaving space
                for peaks before the hard limit.

  peak          The largest absolute sample value in a buffer.

  normalize     Scale a buffer so its peak lands exactly on a target level.

  clamp         Hard-limit every sample to [-1.0, +1.0]. The last resort:
                clamping a loud signal adds distortion.


Clipping Risk
-------------

Two signals that each peak at 1.0 can sum to 2.0 - beyond the normal
[-1.0, +1.0] range.

    Signal A:  [ 1.0,  0.5, -0.5, -1.0]
    Signal B:  [ 1.0,  0.8,  0.2, -0.5]
    Sum:       [ 2.0,  1.3, -0.3, -1.5]  ← exceeds ±1.0!

The mixer applies, in order:
1. Headroom gain to the summed signal
2. Normalization, only if the peak still exceeds 1.0
3. Clamping, which after step 2 only catches rounding error


Phase Relationships
-------------------

When mixing similar signals (e.g., two sine waves at the same frequency):

  IN PHASE:      Signals add constructively → louder (up to 2×)
  OUT OF PHASE:  Signals cancel → quieter (potentially silent!)

Chord tones sit at different frequencies, so their phase relationships
average out and peaks stay well below the naive sum.
*/

/// Add `b` into `a` starting at `offset`, scaled by `gain`.
///
/// Samples of `b` past the end of `a` are dropped.
#[inline]
pub fn sum_into(a: &mut [f32], b: &[f32], offset: usize, gain: f32) {
    let Some(dst) = a.get_mut(offset..) else {
        return;
    };
    for (sa, &sb) in dst.iter_mut().zip(b.iter()) {
        *sa += sb * gain;
    }
}

/// Add signal B into signal A in-place (summing).
///
/// ⚠️ WARNING: Can exceed [-1.0, +1.0] range!
#[inline]
pub fn sum_in_place(a: &mut [f32], b: &[f32]) {
    sum_into(a, b, 0, 1.0);
}

#[inline]
pub fn scale_in_place(buffer: &mut [f32], gain: f32) {
    for sample in buffer.iter_mut() {
        *sample *= gain;
    }
}

pub fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
}

/// Scale `buffer` down so its peak is `target`. Quieter buffers are untouched.
pub fn normalize_above(buffer: &mut [f32], target: f32) -> bool {
    let peak = peak(buffer);
    if peak > target && peak.is_finite() {
        scale_in_place(buffer, target / peak);
        true
    } else {
        false
    }
}

#[inline]
pub fn clamp_in_place(buffer: &mut [f32]) {
    for sample in buffer.iter_mut() {
        *sample = sample.clamp(-1.0, 1.0);
    }
}

/// Blend dry and wet samples using linear crossfade (single sample version).
///
/// output = (dry × (1-mix)) + (wet × mix)
#[inline]
pub fn blend_dry_wet(dry: f32, wet: f32, mix: f32) -> f32 {
    dry * (1.0 - mix) + wet * mix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_can_exceed_one() {
        let mut a = [1.0, 0.5];
        let b = [1.0, 0.8];

        sum_in_place(&mut a, &b);

        assert_eq!(a[0], 2.0); // Exceeds 1.0!
        assert_eq!(a[1], 1.3);
    }

    #[test]
    fn sum_into_respects_offset_and_bounds() {
        let mut a = [0.0; 4];
        sum_into(&mut a, &[1.0, 1.0, 1.0], 2, 0.5);
        assert_eq!(a, [0.0, 0.0, 0.5, 0.5]);

        sum_into(&mut a, &[1.0], 10, 1.0);
        assert_eq!(a, [0.0, 0.0, 0.5, 0.5]);
    }

    #[test]
    fn normalize_only_when_above_target() {
        let mut loud = [2.0, -4.0, 1.0];
        assert!(normalize_above(&mut loud, 1.0));
        assert_eq!(loud, [0.5, -1.0, 0.25]);

        let mut quiet = [0.2, -0.3];
        assert!(!normalize_above(&mut quiet, 1.0));
        assert_eq!(quiet, [0.2, -0.3]);
    }

    #[test]
    fn clamp_limits_to_unit_range() {
        let mut buffer = [1.5, -2.0, 0.3];
        clamp_in_place(&mut buffer);
        assert_eq!(buffer, [1.0, -1.0, 0.3]);
        assert_eq!(peak(&buffer), 1.0);
    }

    #[test]
    fn test_blend_dry_wet() {
        assert_eq!(blend_dry_wet(1.0, 0.5, 0.0), 1.0);
        assert_eq!(blend_dry_wet(1.0, 0.5, 1.0), 0.5);
        assert_eq!(blend_dry_wet(1.0, 0.0, 0.5), 0.5);
    }
}
