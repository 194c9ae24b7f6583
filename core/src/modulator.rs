use crate::error::Result;
use crate::framing::{bytes_to_symbols, encode_payload};
use crate::fsk::symbol_waveform;
use crate::{PREAMBLE_SYMBOLS, SAMPLES_PER_SYMBOL};

/// Build the transmit waveform for one chat frame
///
/// The waveform is the preamble tone pattern followed by the payload symbols,
/// back to back with no gaps, ready for a single blocking write to the
/// speaker. Fails only when the sender name cannot fit its length prefix.
pub fn frame_waveform(sender: &str, message: &str) -> Result<Vec<i16>> {
    let payload = encode_payload(sender, message)?;
    let symbols = bytes_to_symbols(&payload);

    let mut samples =
        Vec::with_capacity((PREAMBLE_SYMBOLS.len() + symbols.len()) * SAMPLES_PER_SYMBOL);
    for &symbol in PREAMBLE_SYMBOLS.iter().chain(symbols.iter()) {
        samples.extend_from_slice(&symbol_waveform(symbol));
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatModemError;
    use crate::fsk::detect_symbol;

    #[test]
    fn test_frame_waveform_length() {
        // Payload "alice"/"hi" is 8 bytes = 22 symbols, plus 4 preamble symbols
        let samples = frame_waveform("alice", "hi").unwrap();
        assert_eq!(samples.len(), 26 * SAMPLES_PER_SYMBOL);
    }

    #[test]
    fn test_frame_waveform_starts_with_preamble() {
        let samples = frame_waveform("alice", "hi").unwrap();
        for (i, &expected) in PREAMBLE_SYMBOLS.iter().enumerate() {
            let chunk: Vec<f32> = samples[i * SAMPLES_PER_SYMBOL..(i + 1) * SAMPLES_PER_SYMBOL]
                .iter()
                .map(|&s| s as f32 / 32768.0)
                .collect();
            assert_eq!(detect_symbol(&chunk), expected, "chunk {}", i);
        }
    }

    #[test]
    fn test_frame_waveform_rejects_long_sender() {
        let sender = "x".repeat(300);
        match frame_waveform(&sender, "hi") {
            Err(ChatModemError::SenderTooLong(300)) => {}
            other => panic!("expected SenderTooLong, got {:?}", other),
        }
    }
}
