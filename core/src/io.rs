use crate::error::Result;

/// Blocking capture stream of mono 16-bit samples at the modem sample rate
///
/// Implementations are moved into the capture thread, which polls in a loop
/// until told to stop.
pub trait AudioInput: Send {
    /// Read up to `buf.len()` samples, returning how many were written
    ///
    /// `Ok(0)` is a timeout tick: no samples arrived in time but the stream
    /// is still alive. The capture loop relies on these ticks to observe its
    /// stop flag, so implementations must not block indefinitely.
    fn read(&mut self, buf: &mut [i16]) -> Result<usize>;
}

/// Blocking playback sink for mono 16-bit samples at the modem sample rate
pub trait AudioOutput: Send {
    /// Write one whole waveform, returning once it has been handed off
    ///
    /// Each call carries a complete frame; the writer thread serializes calls
    /// so frames never interleave on the air.
    fn write(&mut self, samples: &[i16]) -> Result<()>;
}
