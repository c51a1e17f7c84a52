//! The byte-oriented output the mono samples go to.
use embedded_io::{Write, WriteReady};

/// Accepts one unsigned 8 bit sample at a time.
pub trait SampleSink {
    /// Whether a sample can be written right now. Must not block.
    fn is_ready(&mut self) -> bool;

    /// Write a sample. Only called after [`SampleSink::is_ready`] returned `true`.
    fn write_sample(&mut self, sample: u8);
}

/// A [`SampleSink`] on top of a serial port (UART), one byte per sample.
///
/// The port is set up by its owner, normally at [`SERIAL_BAUD_RATE`](crate::SERIAL_BAUD_RATE). That is 50 000
/// bytes per second with 8N1 framing, which keeps up with sampling frequencies up to 50 kHz.
pub struct SerialSink<W> {
    uart: W,
}

impl<W: Write + WriteReady> SerialSink<W> {
    pub fn new(uart: W) -> Self {
        SerialSink { uart }
    }

    pub fn inner(&self) -> &W {
        &self.uart
    }

    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.uart
    }

    pub fn into_inner(self) -> W {
        self.uart
    }
}

impl<W: Write + WriteReady> SampleSink for SerialSink<W> {
    fn is_ready(&mut self) -> bool {
        // A port that reports an error is treated as busy.
        self.uart.write_ready().unwrap_or(false)
    }

    fn write_sample(&mut self, sample: u8) {
        // There is no retry on the real-time path. A failed write loses the sample like a busy port.
        let _ = self.uart.write(&[sample]);
    }
}
