use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig, SupportedStreamConfig};
use log::error;
use thiserror::Error;

use tonechat_core::{AudioInput, AudioOutput, ChatModemError, SAMPLE_RATE};

/// How long a capture read waits before returning an empty tick
const READ_TICK: Duration = Duration::from_millis(100);

/// How often a blocking write rechecks the playback queue
const WRITE_TICK: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum AudioSetupError {
    #[error("No default input device")]
    NoInputDevice,

    #[error("No default output device")]
    NoOutputDevice,

    #[error("No supported stream config at {0} Hz")]
    NoSupportedConfig(u32),

    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Audio stream error: {0}")]
    Stream(String),
}

/// Pick an f32 config at the modem sample rate, preferring the fewest channels
fn pick_config<I>(ranges: I, rate: u32) -> Option<SupportedStreamConfig>
where
    I: Iterator<Item = cpal::SupportedStreamConfigRange>,
{
    ranges
        .filter(|range| range.sample_format() == SampleFormat::F32)
        .filter(|range| range.min_sample_rate().0 <= rate && range.max_sample_rate().0 >= rate)
        .min_by_key(|range| range.channels())
        .map(|range| range.with_sample_rate(SampleRate(rate)))
}

/// Microphone capture through cpal, surfaced as blocking chunked reads
///
/// cpal streams are not `Send`, so device acquisition and the stream itself
/// live on a dedicated thread for the lifetime of this handle. The stream
/// callback downmixes to mono 16-bit chunks and hands them over a channel
/// that `read` drains.
pub struct CpalInput {
    samples: Receiver<Vec<i16>>,
    pending: VecDeque<i16>,
    failed: Arc<AtomicBool>,
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CpalInput {
    pub fn open() -> Result<CpalInput, AudioSetupError> {
        let (data_tx, data_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let failed = Arc::new(AtomicBool::new(false));

        let thread = thread::spawn({
            let failed = Arc::clone(&failed);
            move || {
                let stream = match build_capture_stream(data_tx, &failed) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(AudioSetupError::Stream(e.to_string())));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                // Park here until the handle drops, keeping the stream alive
                let _ = shutdown_rx.recv();
                drop(stream);
            }
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(CpalInput {
                samples: data_rx,
                pending: VecDeque::new(),
                failed,
                shutdown: Some(shutdown_tx),
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(AudioSetupError::Stream("input stream thread exited".into()))
            }
        }
    }
}

impl AudioInput for CpalInput {
    fn read(&mut self, buf: &mut [i16]) -> tonechat_core::Result<usize> {
        if self.failed.load(Ordering::Relaxed) {
            return Err(ChatModemError::Device("input stream failed".into()));
        }

        if self.pending.is_empty() {
            match self.samples.recv_timeout(READ_TICK) {
                Ok(chunk) => self.pending.extend(chunk),
                Err(RecvTimeoutError::Timeout) => return Ok(0),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ChatModemError::Device("input stream closed".into()));
                }
            }
        }

        let count = buf.len().min(self.pending.len());
        for (slot, sample) in buf.iter_mut().zip(self.pending.drain(..count)) {
            *slot = sample;
        }
        Ok(count)
    }
}

impl Drop for CpalInput {
    fn drop(&mut self) {
        // Dropping the sender releases the stream thread, which releases the device
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn build_capture_stream(
    data_tx: Sender<Vec<i16>>,
    failed: &Arc<AtomicBool>,
) -> Result<cpal::Stream, AudioSetupError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(AudioSetupError::NoInputDevice)?;
    let ranges = device
        .supported_input_configs()
        .map_err(|e| AudioSetupError::Device(e.to_string()))?;
    let config: StreamConfig = pick_config(ranges, SAMPLE_RATE as u32)
        .ok_or(AudioSetupError::NoSupportedConfig(SAMPLE_RATE as u32))?
        .config();

    let channels = config.channels as usize;
    let data_cb = move |data: &[f32], _: &cpal::InputCallbackInfo| {
        let mono: Vec<i16> = data
            .chunks(channels)
            .map(|frame| {
                let sample = frame.iter().sum::<f32>() / channels as f32;
                (sample.clamp(-1.0, 1.0) * 32767.0) as i16
            })
            .collect();
        let _ = data_tx.send(mono);
    };
    let err_cb = {
        let failed = Arc::clone(failed);
        move |err: cpal::StreamError| {
            error!("input stream error: {}", err);
            failed.store(true, Ordering::Relaxed);
        }
    };

    device
        .build_input_stream(&config, data_cb, err_cb, None)
        .map_err(|e| AudioSetupError::Stream(e.to_string()))
}

/// Speaker playback through cpal with blocking whole-waveform writes
///
/// Samples queue behind a mutex; the stream callback drains them in order,
/// duplicating mono samples across the device channels, and `write` returns
/// once the queue is empty. All frames flow through the one queue, so two
/// writes can never interleave on the air.
pub struct CpalOutput {
    playback: Arc<(Mutex<VecDeque<f32>>, Condvar)>,
    failed: Arc<AtomicBool>,
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CpalOutput {
    pub fn open() -> Result<CpalOutput, AudioSetupError> {
        let playback = Arc::new((Mutex::new(VecDeque::new()), Condvar::new()));
        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let failed = Arc::new(AtomicBool::new(false));

        let thread = thread::spawn({
            let playback = Arc::clone(&playback);
            let failed = Arc::clone(&failed);
            move || {
                let stream = match build_playback_stream(playback, &failed) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(AudioSetupError::Stream(e.to_string())));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                let _ = shutdown_rx.recv();
                drop(stream);
            }
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(CpalOutput {
                playback,
                failed,
                shutdown: Some(shutdown_tx),
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(AudioSetupError::Stream("output stream thread exited".into()))
            }
        }
    }
}

impl AudioOutput for CpalOutput {
    fn write(&mut self, samples: &[i16]) -> tonechat_core::Result<()> {
        let (queue, drained) = &*self.playback;
        let mut queue = queue
            .lock()
            .map_err(|_| ChatModemError::Device("playback queue poisoned".into()))?;
        queue.extend(samples.iter().map(|&s| s as f32 / 32768.0));

        while !queue.is_empty() {
            if self.failed.load(Ordering::Relaxed) {
                return Err(ChatModemError::Device("output stream failed".into()));
            }
            queue = drained
                .wait_timeout(queue, WRITE_TICK)
                .map_err(|_| ChatModemError::Device("playback queue poisoned".into()))?
                .0;
        }
        Ok(())
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn build_playback_stream(
    playback: Arc<(Mutex<VecDeque<f32>>, Condvar)>,
    failed: &Arc<AtomicBool>,
) -> Result<cpal::Stream, AudioSetupError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(AudioSetupError::NoOutputDevice)?;
    let ranges = device
        .supported_output_configs()
        .map_err(|e| AudioSetupError::Device(e.to_string()))?;
    let config: StreamConfig = pick_config(ranges, SAMPLE_RATE as u32)
        .ok_or(AudioSetupError::NoSupportedConfig(SAMPLE_RATE as u32))?
        .config();

    let channels = config.channels as usize;
    let data_cb = move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        let (queue, drained) = &*playback;
        let mut queue = match queue.lock() {
            Ok(queue) => queue,
            Err(_) => return,
        };
        for frame in data.chunks_mut(channels) {
            let sample = queue.pop_front().unwrap_or(0.0);
            for slot in frame.iter_mut() {
                *slot = sample;
            }
        }
        if queue.is_empty() {
            drained.notify_all();
        }
    };
    let err_cb = {
        let failed = Arc::clone(failed);
        move |err: cpal::StreamError| {
            error!("output stream error: {}", err);
            failed.store(true, Ordering::Relaxed);
        }
    };

    device
        .build_output_stream(&config, data_cb, err_cb, None)
        .map_err(|e| AudioSetupError::Stream(e.to_string()))
}
