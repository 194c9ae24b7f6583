use std::f32::consts::PI;

use crate::{BASE_FREQUENCY, FREQUENCY_SPACING, NUM_SYMBOLS, SAMPLE_RATE, SAMPLES_PER_SYMBOL};

// 8-FSK configuration for near-ultrasonic transmission
//
// Frequency band design:
// - 8 carriers with 485 Hz spacing
// - Base frequency: 17000 Hz (above most adult hearing)
// - Maximum frequency: 20395 Hz (17000 + 7*485), below the 22050 Hz Nyquist limit
//
// Symbol parameters (at 44.1kHz sample rate):
// - 176 samples = 4ms per symbol (750 bits/sec raw throughput)
// - One carrier per symbol, no windowing or gain conditioning
// - Goertzel algorithm for single-bin energy detection

/// Peak amplitude of generated tones relative to i16 full scale
const TONE_AMPLITUDE: f32 = 0.9;

/// Carrier frequency in Hz for a 3-bit symbol value
pub fn carrier_frequency(symbol: u8) -> f32 {
    debug_assert!((symbol as usize) < NUM_SYMBOLS);
    BASE_FREQUENCY + symbol as f32 * FREQUENCY_SPACING
}

/// Generate one symbol duration of the carrier tone for `symbol`
///
/// Produces 176 signed 16-bit samples at 90% full scale. Callers must pass
/// a symbol value in 0..8.
pub fn symbol_waveform(symbol: u8) -> Vec<i16> {
    let frequency = carrier_frequency(symbol);
    let angular_freq = 2.0 * PI * frequency / SAMPLE_RATE as f32;

    (0..SAMPLES_PER_SYMBOL)
        .map(|i| ((angular_freq * i as f32).sin() * TONE_AMPLITUDE * i16::MAX as f32) as i16)
        .collect()
}

/// Compute power for a specific frequency using the Goertzel algorithm
pub fn goertzel_energy(samples: &[f32], freq: f32) -> f32 {
    let n = samples.len();
    let k = (0.5 + (n as f32 * freq / SAMPLE_RATE as f32)) as usize;
    let omega = 2.0 * PI * k as f32 / n as f32;
    let coeff = 2.0 * omega.cos();

    let mut q1 = 0.0;
    let mut q2 = 0.0;

    for &sample in samples {
        let q0 = coeff * q1 - q2 + sample;
        q2 = q1;
        q1 = q0;
    }

    // Compute power (magnitude squared)
    let real = q1 - q2 * omega.cos();
    let imag = q2 * omega.sin();
    real * real + imag * imag
}

/// Detect the symbol carried by one chunk of normalized samples
///
/// Runs Goertzel at each of the 8 candidate carriers and picks the strongest.
/// There is no noise floor: silence or noise still yields a symbol value
/// (symbol 0 when no carrier dominates), so framing must reject false hits.
pub fn detect_symbol(chunk: &[f32]) -> u8 {
    let mut detected = 0u8;
    let mut max_energy = 0.0f32;

    for symbol in 0..NUM_SYMBOLS as u8 {
        let energy = goertzel_energy(chunk, carrier_frequency(symbol));
        if energy > max_energy {
            max_energy = energy;
            detected = symbol;
        }
    }

    detected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized_waveform(symbol: u8) -> Vec<f32> {
        symbol_waveform(symbol)
            .iter()
            .map(|&s| s as f32 / 32768.0)
            .collect()
    }

    #[test]
    fn test_carrier_frequencies() {
        assert_eq!(carrier_frequency(0), 17000.0);
        assert_eq!(carrier_frequency(1), 17485.0);
        assert_eq!(carrier_frequency(7), 20395.0);
    }

    #[test]
    fn test_symbol_waveform_shape() {
        for symbol in 0..NUM_SYMBOLS as u8 {
            let samples = symbol_waveform(symbol);
            assert_eq!(samples.len(), SAMPLES_PER_SYMBOL);
            assert_eq!(samples[0], 0); // sine starts at zero phase

            let peak = samples.iter().map(|s| s.abs()).max().unwrap();
            assert!(peak <= 29491, "peak {} exceeds 90% full scale", peak);
            assert!(peak > 25000, "peak {} too quiet", peak);
        }
    }

    #[test]
    fn test_goertzel_peaks_at_own_carrier() {
        let samples = normalized_waveform(3);
        let on_carrier = goertzel_energy(&samples, carrier_frequency(3));
        let off_carrier = goertzel_energy(&samples, carrier_frequency(4));
        assert!(
            on_carrier > off_carrier * 10.0,
            "on={} off={}",
            on_carrier,
            off_carrier
        );
    }

    #[test]
    fn test_detect_all_symbols() {
        for symbol in 0..NUM_SYMBOLS as u8 {
            let samples = normalized_waveform(symbol);
            assert_eq!(detect_symbol(&samples), symbol);
        }
    }

    #[test]
    fn test_detect_silence_is_symbol_zero() {
        let silence = vec![0.0f32; SAMPLES_PER_SYMBOL];
        assert_eq!(detect_symbol(&silence), 0);
    }

    #[test]
    fn test_detect_gain_invariance() {
        let samples = normalized_waveform(5);
        for gain in [0.01, 0.1, 0.5, 2.0] {
            let scaled: Vec<f32> = samples.iter().map(|s| s * gain).collect();
            assert_eq!(detect_symbol(&scaled), 5, "failed at gain {}", gain);
        }
    }
}
