use tonechat_core::{frame_waveform, ChatFrame, Demodulator};
use wasm_bindgen::prelude::*;

/// A decoded chat frame handed back to JavaScript
#[wasm_bindgen]
pub struct DecodedMessage {
    sender: String,
    message: String,
}

#[wasm_bindgen]
impl DecodedMessage {
    #[wasm_bindgen(getter)]
    pub fn sender(&self) -> String {
        self.sender.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn message(&self) -> String {
        self.message.clone()
    }
}

impl From<ChatFrame> for DecodedMessage {
    fn from(frame: ChatFrame) -> Self {
        DecodedMessage {
            sender: frame.sender,
            message: frame.message,
        }
    }
}

#[wasm_bindgen]
pub struct WasmModulator;

#[wasm_bindgen]
impl WasmModulator {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmModulator {
        WasmModulator
    }

    /// Build the waveform for one framed message
    /// Returns an Int16Array of mono PCM samples at 44100 Hz
    #[wasm_bindgen]
    pub fn modulate(&self, sender: &str, message: &str) -> Result<Vec<i16>, JsValue> {
        frame_waveform(sender, message).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

#[wasm_bindgen]
pub struct WasmDemodulator {
    username: String,
    inner: Demodulator,
}

#[wasm_bindgen]
impl WasmDemodulator {
    #[wasm_bindgen(constructor)]
    pub fn new(username: &str) -> WasmDemodulator {
        WasmDemodulator {
            username: username.to_string(),
            inner: Demodulator::new(),
        }
    }

    /// Feed one capture buffer of normalized samples
    /// Takes a Float32Array from WebAudio and returns the next decoded
    /// message, unless it was our own frame echoing back
    #[wasm_bindgen]
    pub fn push(&mut self, samples: &[f32]) -> Option<DecodedMessage> {
        let frame = self.inner.push_normalized(samples)?;
        if frame.sender == self.username {
            return None;
        }
        Some(frame.into())
    }
}

#[wasm_bindgen(start)]
pub fn init() {
    // Optional panic hook setup
}
