//! Fixed-capacity ring buffer delay line.
//!
//! ```text
//!            write_pos
//!                ↓
//! [ . . . . . . [n] . . . . . . . ]   capacity samples, wraps around
//!           ↑
//!   newest - delay
//! ```
//!
//! Reads accept fractional delays and interpolate linearly between the two
//! neighbouring samples. Delays longer than the buffer are clamped to the
//! oldest stored sample; a read can never leave the buffer.

/// Smallest usable ring.
const MIN_CAPACITY: usize = 2;

pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(MIN_CAPACITY)],
            write_pos: 0,
        }
    }

    /// Capacity covering `seconds` of audio at `sample_rate`.
    pub fn with_duration(seconds: f32, sample_rate: f32) -> Self {
        Self::new((seconds.max(0.0) * sample_rate.max(1.0)).ceil() as usize)
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Longest delay (in samples) a read can reach.
    pub fn max_delay(&self) -> f32 {
        (self.capacity() - 1) as f32
    }

    /// Read `delay_samples` behind the newest written sample (0 = newest).
    pub fn tap(&self, delay_samples: f32) -> f32 {
        let capacity = self.capacity();
        let delay = if delay_samples.is_finite() {
            delay_samples.clamp(0.0, self.max_delay())
        } else {
            0.0
        };

        let whole = delay.floor();
        let frac = delay - whole;

        let newest = (self.write_pos + capacity - 1) % capacity;
        let near = (newest + capacity - whole as usize) % capacity;
        let far = (near + capacity - 1) % capacity;

        let a = self.buffer[near];
        let b = self.buffer[far];
        a + (b - a) * frac
    }

    pub fn push(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.capacity();
    }

    /// Write `sample`, then read `delay_samples` behind it.
    pub fn next_sample(&mut self, sample: f32, delay_samples: f32) -> f32 {
        self.push(sample);
        self.tap(delay_samples)
    }

    pub fn render(&mut self, buffer: &mut [f32], delay_samples: f32) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, delay_samples);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
