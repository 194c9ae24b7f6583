//! Acoustic chat library for short text messages between nearby devices
//!
//! Uses 8-FSK tones in the near-ultrasonic band (17.0-20.4kHz) with Goertzel detection

pub mod error;
pub mod fsk;
pub mod framing;
pub mod sync;
pub mod modulator;
pub mod demodulator;
pub mod io;
pub mod chat;

pub use chat::{ChatConfig, ChatNode};
pub use demodulator::Demodulator;
pub use error::{ChatModemError, Result};
pub use framing::ChatFrame;
pub use io::{AudioInput, AudioOutput};
pub use modulator::frame_waveform;

// Configuration constants
pub const SAMPLE_RATE: usize = 44100;
pub const SYMBOL_DURATION_MS: usize = 4;
pub const SAMPLES_PER_SYMBOL: usize = (SAMPLE_RATE * SYMBOL_DURATION_MS) / 1000; // 176

// FSK configuration
pub const BITS_PER_SYMBOL: usize = 3;
pub const NUM_SYMBOLS: usize = 1 << BITS_PER_SYMBOL; // 8
pub const BASE_FREQUENCY: f32 = 17000.0; // Hz
pub const FREQUENCY_SPACING: f32 = 485.0; // Hz

// Frame configuration
pub const PREAMBLE_SYMBOLS: [u8; 4] = [0, 7, 0, 7];
pub const SCAN_WINDOW_SYMBOLS: usize = 50;
pub const PAYLOAD_WINDOW_SYMBOLS: usize = SCAN_WINDOW_SYMBOLS - PREAMBLE_SYMBOLS.len(); // 46
pub const MAX_FRAME_PAYLOAD_BYTES: usize = (PAYLOAD_WINDOW_SYMBOLS * BITS_PER_SYMBOL) / 8; // 17

// Capture configuration
pub const READ_CHUNK_SAMPLES: usize = SAMPLES_PER_SYMBOL * 4; // 704
pub const DEMOD_TRIGGER_SYMBOLS: usize = 30;
pub const BUFFER_KEEP_SYMBOLS: usize = 50;
pub const BUFFER_LIMIT_SYMBOLS: usize = 100;
