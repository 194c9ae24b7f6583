use crate::error::{ChatModemError, Result};
use crate::BITS_PER_SYMBOL;

/// One decoded chat frame: who sent it and what they said
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatFrame {
    pub sender: String,
    pub message: String,
}

/// Build the frame payload: `[sender_len][sender bytes][message bytes]`
///
/// The sender name carries a one-byte length prefix; the message runs to the
/// end of the payload with no length of its own.
pub fn encode_payload(sender: &str, message: &str) -> Result<Vec<u8>> {
    if sender.len() > u8::MAX as usize {
        return Err(ChatModemError::SenderTooLong(sender.len()));
    }

    let mut payload = Vec::with_capacity(1 + sender.len() + message.len());
    payload.push(sender.len() as u8);
    payload.extend_from_slice(sender.as_bytes());
    payload.extend_from_slice(message.as_bytes());
    Ok(payload)
}

/// Parse recovered payload bytes back into a frame
///
/// The message may carry trailing NUL bytes when the payload window extended
/// past the real frame into silence; those are stripped. NULs inside the
/// sender name are kept as-is.
pub fn decode_payload(payload: &[u8]) -> Result<ChatFrame> {
    if payload.len() < 2 {
        return Err(ChatModemError::PayloadTooShort);
    }

    let sender_len = payload[0] as usize;
    let rest = &payload[1..];
    if rest.len() < sender_len {
        return Err(ChatModemError::SenderLengthOutOfRange);
    }

    let sender = String::from_utf8_lossy(&rest[..sender_len]).into_owned();
    let message = String::from_utf8_lossy(&rest[sender_len..])
        .trim_end_matches('\0')
        .to_string();

    Ok(ChatFrame { sender, message })
}

/// Expand bytes into 3-bit symbols, MSB first
///
/// A final bit group shorter than 3 bits is left-aligned and zero-padded,
/// matching what `symbols_to_bytes` discards on the way back.
pub fn bytes_to_symbols(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for i in (0..8).rev() {
            bits.push((byte >> i) & 1);
        }
    }

    let mut symbols = Vec::with_capacity((bits.len() + BITS_PER_SYMBOL - 1) / BITS_PER_SYMBOL);
    for group in bits.chunks(BITS_PER_SYMBOL) {
        let mut symbol = 0u8;
        for i in 0..BITS_PER_SYMBOL {
            symbol <<= 1;
            if let Some(&bit) = group.get(i) {
                symbol |= bit;
            }
        }
        symbols.push(symbol);
    }

    symbols
}

/// Repack 3-bit symbols into bytes, MSB first
///
/// Trailing bits that do not fill a whole byte are discarded.
pub fn symbols_to_bytes(symbols: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(symbols.len() * BITS_PER_SYMBOL);
    for &symbol in symbols {
        for i in (0..BITS_PER_SYMBOL).rev() {
            bits.push((symbol >> i) & 1);
        }
    }

    let mut bytes = Vec::with_capacity(bits.len() / 8);
    for group in bits.chunks_exact(8) {
        let mut byte = 0u8;
        for &bit in group {
            byte = (byte << 1) | bit;
        }
        bytes.push(byte);
    }

    bytes
}
