use log::debug;

use crate::framing::{decode_payload, symbols_to_bytes, ChatFrame};
use crate::fsk::detect_symbol;
use crate::{PREAMBLE_SYMBOLS, SAMPLES_PER_SYMBOL, SCAN_WINDOW_SYMBOLS};

/// Outcome of one scan over the capture buffer
///
/// `consumed` is how many leading samples the caller must discard: zero when
/// no preamble was found, otherwise everything through the end of the payload
/// window regardless of whether the payload parsed.
pub struct ScanResult {
    pub frame: Option<ChatFrame>,
    pub consumed: usize,
}

/// Detect the symbol sequence over consecutive non-overlapping chunks
///
/// Examines at most the first 50 chunks of the buffer; an incomplete trailing
/// chunk is skipped.
pub fn symbolize(samples: &[f32]) -> Vec<u8> {
    samples
        .chunks_exact(SAMPLES_PER_SYMBOL)
        .take(SCAN_WINDOW_SYMBOLS)
        .map(detect_symbol)
        .collect()
}

/// Find the first offset where the fixed preamble pattern appears
pub fn find_preamble(symbols: &[u8]) -> Option<usize> {
    symbols
        .windows(PREAMBLE_SYMBOLS.len())
        .position(|window| window == PREAMBLE_SYMBOLS)
}

/// Scan the capture buffer for one frame
///
/// On a preamble hit the payload window runs from the symbol after the
/// preamble through symbol index `start + 50`, clamped to the symbols
/// actually present. The buffer is consumed through that window even when the
/// payload fails to parse, so the same preamble is never rescanned.
pub fn scan(samples: &[f32]) -> ScanResult {
    let symbols = symbolize(samples);

    let start = match find_preamble(&symbols) {
        Some(start) => start,
        None => {
            return ScanResult {
                frame: None,
                consumed: 0,
            }
        }
    };

    let payload_start = start + PREAMBLE_SYMBOLS.len();
    let payload_end = (start + SCAN_WINDOW_SYMBOLS).min(symbols.len());
    let payload = symbols_to_bytes(&symbols[payload_start..payload_end]);

    let frame = match decode_payload(&payload) {
        Ok(frame) => Some(frame),
        Err(e) => {
            debug!("discarding preamble at chunk {}: {}", start, e);
            None
        }
    };

    let consumed = ((start + SCAN_WINDOW_SYMBOLS) * SAMPLES_PER_SYMBOL).min(samples.len());
    ScanResult { frame, consumed }
}
