//! The work done on every sample clock tick.
#[cfg(feature = "defmt")]
use defmt::trace;
#[cfg(not(feature = "defmt"))]
use log::trace;

use super::{downmix, to_unsigned};
use crate::serial_sink::SampleSink;
use crate::usb_audio::FrameSource;

/// What happened during one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// The sample was written to the sink.
    Emitted(u8),
    /// No frame had arrived from the host (underrun).
    FrameUnavailable,
    /// The sink was not ready, the sample was dropped.
    SinkBusy,
}

/// Wrapping counters of tick outcomes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineStats {
    pub emitted: u32,
    pub underruns: u32,
    pub dropped: u32,
}

/// Moves one frame from the endpoint to the sink per tick.
///
/// Nothing is buffered between ticks: a missing frame produces no output, and a busy sink loses the sample.
pub struct TickPipeline<S: FrameSource, K: SampleSink> {
    source: S,
    sink: K,
    stats: PipelineStats,
}

impl<S: FrameSource, K: SampleSink> TickPipeline<S, K> {
    pub fn new(source: S, sink: K) -> Self {
        TickPipeline {
            source,
            sink,
            stats: PipelineStats::default(),
        }
    }

    /// Process one tick. Never blocks.
    pub fn run(&mut self) -> TickOutcome {
        if !self.source.is_frame_available() {
            self.stats.underruns = self.stats.underruns.wrapping_add(1);
            return TickOutcome::FrameUnavailable;
        }

        let frame = self.source.read_frame();
        let sample = to_unsigned(downmix(frame.left, frame.right));

        if !self.sink.is_ready() {
            self.stats.dropped = self.stats.dropped.wrapping_add(1);
            trace!("Sink busy, dropped sample {}", sample);
            return TickOutcome::SinkBusy;
        }

        self.sink.write_sample(sample);
        self.stats.emitted = self.stats.emitted.wrapping_add(1);

        TickOutcome::Emitted(sample)
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }
}
