//! Audio frames arriving on the isochronous OUT endpoint.
//!
//! USB packets are read in the main context and their samples queued, one sample per queue slot. The sample
//! clock interrupt takes them out again, one stereo frame per tick.
#[cfg(feature = "defmt")]
use defmt::{trace, warn};
use heapless::spsc::{Consumer, Producer, Queue};
#[cfg(not(feature = "defmt"))]
use log::{trace, warn};

use crate::*;

/// One left/right pair of signed 16 bit samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StereoFrame {
    pub left: i16,
    pub right: i16,
}

/// Where the tick pipeline takes its frames from.
pub trait FrameSource {
    /// Whether a complete frame is ready to be read.
    fn is_frame_available(&mut self) -> bool;

    /// Take the next frame. Only called after [`FrameSource::is_frame_available`] returned `true`.
    fn read_frame(&mut self) -> StereoFrame;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// The packet does not hold a whole number of stereo frames.
    InvalidLength(usize),
}

/// Split a frame queue into its endpoint side and its sample clock side.
pub fn split<const N: usize>(queue: &mut Queue<i16, N>) -> (PacketWriter<'_, N>, PacketFrameSource<'_, N>) {
    let (producer, consumer) = queue.split();

    (PacketWriter { producer }, PacketFrameSource { consumer })
}

/// Queues samples from OUT endpoint packets.
pub struct PacketWriter<'q, const N: usize> {
    producer: Producer<'q, i16, N>,
}

impl<'q, const N: usize> PacketWriter<'q, N> {
    /// Queue the frames of one packet of interleaved little-endian stereo samples.
    ///
    /// Returns the number of frames queued. Frames that do not fit are dropped, so the queue only ever
    /// holds whole frames.
    pub fn write_packet(&mut self, data: &[u8]) -> Result<usize, PacketError> {
        if data.len() % FRAME_SIZE != 0 {
            warn!("Invalid USB packet size of {}, skipped.", data.len());
            return Err(PacketError::InvalidLength(data.len()));
        }

        let mut queued = 0;
        for frame in data.chunks_exact(FRAME_SIZE) {
            if self.free() < INPUT_CHANNEL_COUNT {
                break;
            }

            for sample in frame.chunks_exact(SAMPLE_SIZE) {
                // Room for the whole frame was checked above.
                let _ = self.producer.enqueue(i16::from_le_bytes([sample[0], sample[1]]));
            }
            queued += 1;
        }

        let total = data.len() / FRAME_SIZE;
        if queued < total {
            trace!("Frame queue full, dropped {} of {} frames", total - queued, total);
        }

        Ok(queued)
    }

    /// Number of free sample slots.
    pub fn free(&self) -> usize {
        self.producer.capacity() - self.producer.len()
    }
}

/// Hands queued frames to the tick pipeline.
pub struct PacketFrameSource<'q, const N: usize> {
    consumer: Consumer<'q, i16, N>,
}

impl<'q, const N: usize> PacketFrameSource<'q, N> {
    /// Number of whole frames waiting.
    pub fn frames_queued(&self) -> usize {
        self.consumer.len() / INPUT_CHANNEL_COUNT
    }
}

impl<'q, const N: usize> FrameSource for PacketFrameSource<'q, N> {
    fn is_frame_available(&mut self) -> bool {
        self.consumer.len() >= INPUT_CHANNEL_COUNT
    }

    fn read_frame(&mut self) -> StereoFrame {
        let left = self.consumer.dequeue().unwrap_or_default();
        let right = self.consumer.dequeue().unwrap_or_default();

        StereoFrame { left, right }
    }
}
