// Full modulate/demodulate roundtrips through the sliding capture buffer.
//
// A frame alone is shorter than the 30-symbol demodulation trigger, so most
// tests follow it with silence the way a live microphone would.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use tonechat_core::{
    frame_waveform, Demodulator, DEMOD_TRIGGER_SYMBOLS, SAMPLES_PER_SYMBOL,
};

fn trailing_silence() -> Vec<i16> {
    vec![0i16; DEMOD_TRIGGER_SYMBOLS * SAMPLES_PER_SYMBOL]
}

#[test]
fn test_frame_round_trip() {
    let samples = frame_waveform("alice", "hi").expect("Failed to build waveform");

    let mut demodulator = Demodulator::new();
    assert!(demodulator.push_i16(&samples).is_none());

    let frame = demodulator
        .push_i16(&trailing_silence())
        .expect("Failed to decode frame");
    assert_eq!(frame.sender, "alice");
    assert_eq!(frame.message, "hi");
}

#[test]
fn test_round_trip_empty_message() {
    let samples = frame_waveform("bob", "").expect("Failed to build waveform");

    let mut demodulator = Demodulator::new();
    demodulator.push_i16(&samples);
    let frame = demodulator
        .push_i16(&trailing_silence())
        .expect("Failed to decode frame");
    assert_eq!(frame.sender, "bob");
    assert_eq!(frame.message, "");
}

#[test]
fn test_round_trip_utf8_message() {
    let samples = frame_waveform("ana", "café").expect("Failed to build waveform");

    let mut demodulator = Demodulator::new();
    demodulator.push_i16(&samples);
    let frame = demodulator
        .push_i16(&trailing_silence())
        .expect("Failed to decode frame");
    assert_eq!(frame.sender, "ana");
    assert_eq!(frame.message, "café");
}

#[test]
fn test_round_trip_max_combined_length() {
    // 1 + 5 + 11 = 17 payload bytes exactly fills the 46-symbol window
    let samples = frame_waveform("alice", "hello world").expect("Failed to build waveform");
    assert_eq!(samples.len(), 50 * SAMPLES_PER_SYMBOL);

    let mut demodulator = Demodulator::new();
    let frame = demodulator
        .push_i16(&samples)
        .expect("Failed to decode frame");
    assert_eq!(frame.sender, "alice");
    assert_eq!(frame.message, "hello world");
}

#[test]
fn test_oversized_frame_truncates_message() {
    // 18 payload bytes: one more than the window carries, so the last
    // message byte is lost on the receive side
    let samples = frame_waveform("alice", "hello world!").expect("Failed to build waveform");

    let mut demodulator = Demodulator::new();
    let frame = demodulator
        .push_i16(&samples)
        .expect("Failed to decode frame");
    assert_eq!(frame.sender, "alice");
    assert_eq!(frame.message, "hello world");
}

#[test]
fn test_round_trip_with_leading_silence() {
    let mut samples = vec![0i16; 20 * SAMPLES_PER_SYMBOL];
    samples.extend(frame_waveform("alice", "hi").expect("Failed to build waveform"));
    samples.extend(trailing_silence());

    let mut demodulator = Demodulator::new();
    let frame = demodulator
        .push_i16(&samples)
        .expect("Failed to decode frame");
    assert_eq!(frame.sender, "alice");
    assert_eq!(frame.message, "hi");
}

#[test]
fn test_round_trip_with_gaussian_noise() {
    let samples = frame_waveform("alice", "hi").expect("Failed to build waveform");

    // Add noise to the frame itself; the trailing silence stays clean so the
    // padding still decodes to NUL bytes
    let mut rng = StdRng::seed_from_u64(7);
    let normal = Normal::new(0.0f32, 0.05).expect("Failed to build distribution");
    let mut noisy: Vec<f32> = samples
        .iter()
        .map(|&s| s as f32 / 32768.0 + normal.sample(&mut rng))
        .collect();
    noisy.extend(vec![0.0f32; DEMOD_TRIGGER_SYMBOLS * SAMPLES_PER_SYMBOL]);

    let mut demodulator = Demodulator::new();
    let frame = demodulator
        .push_normalized(&noisy)
        .expect("Failed to decode noisy frame");
    assert_eq!(frame.sender, "alice");
    assert_eq!(frame.message, "hi");
}

#[test]
fn test_two_frames_in_sequence() {
    let mut demodulator = Demodulator::new();

    let mut first = frame_waveform("alice", "one").expect("Failed to build waveform");
    first.extend(trailing_silence());
    let frame = demodulator
        .push_i16(&first)
        .expect("Failed to decode first frame");
    assert_eq!(frame.message, "one");

    let mut second = frame_waveform("alice", "two").expect("Failed to build waveform");
    second.extend(trailing_silence());
    let frame = demodulator
        .push_i16(&second)
        .expect("Failed to decode second frame");
    assert_eq!(frame.message, "two");
}

#[test]
fn test_silence_never_decodes() {
    let mut demodulator = Demodulator::new();
    for _ in 0..20 {
        assert!(demodulator.push_i16(&trailing_silence()).is_none());
    }
}
