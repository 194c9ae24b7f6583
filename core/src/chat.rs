use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use crate::demodulator::Demodulator;
use crate::error::{ChatModemError, Result};
use crate::framing::ChatFrame;
use crate::io::{AudioInput, AudioOutput};
use crate::modulator::frame_waveform;
use crate::READ_CHUNK_SAMPLES;

/// Default depth of the outgoing frame queue
const DEFAULT_QUEUE_CAPACITY: usize = 8;

/// Chat node configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Name attached to outgoing frames and used to suppress echoed ones
    pub username: String,
    /// Bounded depth of the outgoing frame queue
    pub queue_capacity: usize,
}

impl ChatConfig {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// A running chat node
///
/// `start` spawns two threads over already-acquired audio devices: a capture
/// thread that owns the demodulator and delivers decoded frames, and a writer
/// thread that plays queued outgoing waveforms one at a time so transmissions
/// never overlap. Dropping the node stops both.
pub struct ChatNode {
    username: String,
    running: Arc<AtomicBool>,
    outgoing: Option<SyncSender<Vec<i16>>>,
    capture: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

impl ChatNode {
    /// Start a node and return it with the channel of incoming frames
    ///
    /// Frames whose sender equals the configured username are suppressed
    /// before delivery; everything else decoded off the microphone arrives on
    /// the receiver in decode order.
    pub fn start<I, O>(
        config: ChatConfig,
        input: I,
        output: O,
    ) -> Result<(ChatNode, Receiver<ChatFrame>)>
    where
        I: AudioInput + 'static,
        O: AudioOutput + 'static,
    {
        if config.username.len() > u8::MAX as usize {
            return Err(ChatModemError::SenderTooLong(config.username.len()));
        }

        let running = Arc::new(AtomicBool::new(true));
        let (frames_tx, frames_rx) = mpsc::channel();
        let (outgoing_tx, outgoing_rx) = mpsc::sync_channel(config.queue_capacity);

        let capture = thread::spawn({
            let running = Arc::clone(&running);
            let username = config.username.clone();
            move || capture_loop(input, running, username, frames_tx)
        });
        let writer = thread::spawn(move || writer_loop(output, outgoing_rx));

        let node = ChatNode {
            username: config.username,
            running,
            outgoing: Some(outgoing_tx),
            capture: Some(capture),
            writer: Some(writer),
        };
        Ok((node, frames_rx))
    }

    /// Queue one message for transmission under the configured username
    ///
    /// Blocks only while the outgoing queue is full. There is no delivery
    /// confirmation; a message that cannot be framed or queued is logged and
    /// dropped.
    pub fn send_message(&self, text: &str) {
        let waveform = match frame_waveform(&self.username, text) {
            Ok(waveform) => waveform,
            Err(e) => {
                warn!("dropping outgoing message: {}", e);
                return;
            }
        };

        match &self.outgoing {
            Some(outgoing) => {
                if outgoing.send(waveform).is_err() {
                    warn!("writer thread is gone; message dropped");
                }
            }
            None => warn!("node is stopped; message dropped"),
        }
    }

    /// Stop both threads and release the audio devices
    ///
    /// Queued outgoing frames finish playing first. Safe to call more than
    /// once; later calls are no-ops.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        // Closing the queue lets the writer drain and exit
        self.outgoing.take();

        if let Some(handle) = self.capture.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.writer.take() {
            let _ = handle.join();
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl Drop for ChatNode {
    fn drop(&mut self) {
        self.stop();
    }
}

fn capture_loop<I: AudioInput>(
    mut input: I,
    running: Arc<AtomicBool>,
    username: String,
    frames: mpsc::Sender<ChatFrame>,
) {
    debug!("capture loop started");
    let mut demodulator = Demodulator::new();
    let mut chunk = vec![0i16; READ_CHUNK_SAMPLES];

    while running.load(Ordering::Relaxed) {
        let count = match input.read(&mut chunk) {
            Ok(count) => count,
            Err(e) => {
                warn!("capture read failed: {}", e);
                break;
            }
        };
        if count == 0 {
            // Timeout tick; loop around so the stop flag is observed
            continue;
        }

        if let Some(frame) = demodulator.push_i16(&chunk[..count]) {
            if frame.sender == username {
                debug!("suppressing own frame");
                continue;
            }
            if frames.send(frame).is_err() {
                debug!("frame receiver dropped; stopping capture");
                break;
            }
        }
    }
    debug!("capture loop stopped");
}

fn writer_loop<O: AudioOutput>(mut output: O, outgoing: mpsc::Receiver<Vec<i16>>) {
    debug!("writer loop started");
    while let Ok(waveform) = outgoing.recv() {
        if let Err(e) = output.write(&waveform) {
            warn!("playback write failed: {}", e);
            break;
        }
    }
    debug!("writer loop stopped");
}
