use crate::framing::ChatFrame;
use crate::sync;
use crate::{
    BUFFER_KEEP_SYMBOLS, BUFFER_LIMIT_SYMBOLS, DEMOD_TRIGGER_SYMBOLS, SAMPLES_PER_SYMBOL,
};

/// Streaming demodulator over a sliding capture buffer
///
/// Appended samples accumulate until at least 30 symbol durations are
/// buffered, then each append runs one scan for a frame. The buffer advances
/// past every preamble hit and is trimmed to the most recent 50 symbol
/// durations whenever it grows beyond 100, so memory stays bounded no matter
/// how long the stream runs.
///
/// The buffer is owned exclusively by this struct; callers interact only
/// through the push methods, which return at most one decoded frame each.
pub struct Demodulator {
    buffer: Vec<f32>,
}

impl Demodulator {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Append raw 16-bit capture samples and look for a frame
    pub fn push_i16(&mut self, samples: &[i16]) -> Option<ChatFrame> {
        self.buffer.extend(samples.iter().map(|&s| s as f32 / 32768.0));
        self.process()
    }

    /// Append already-normalized samples and look for a frame
    pub fn push_normalized(&mut self, samples: &[f32]) -> Option<ChatFrame> {
        self.buffer.extend_from_slice(samples);
        self.process()
    }

    /// Number of samples currently buffered
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn process(&mut self) -> Option<ChatFrame> {
        if self.buffer.len() < DEMOD_TRIGGER_SYMBOLS * SAMPLES_PER_SYMBOL {
            return None;
        }

        let result = sync::scan(&self.buffer);
        if result.consumed > 0 {
            self.buffer.drain(..result.consumed);
        }
        self.trim();
        result.frame
    }

    /// Keep only the most recent 50 symbol durations once past the limit
    fn trim(&mut self) {
        let limit = BUFFER_LIMIT_SYMBOLS * SAMPLES_PER_SYMBOL;
        if self.buffer.len() > limit {
            let keep = BUFFER_KEEP_SYMBOLS * SAMPLES_PER_SYMBOL;
            let excess = self.buffer.len() - keep;
            self.buffer.drain(..excess);
        }
    }
}

impl Default for Demodulator {
    fn default() -> Self {
        Self::new()
    }
}
