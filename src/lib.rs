//! Streaming core of a USB speaker that forwards host audio to a serial sample sink.
//!
//! Interleaved 16-bit stereo samples arrive on an isochronous OUT endpoint. A hardware timer ticks at the
//! current sampling frequency; every tick takes one stereo frame, downmixes it to an unsigned 8-bit mono
//! sample and hands it to a byte-oriented sink (typically a UART). The host may change the sampling
//! frequency at any time through the UAC1 sampling frequency endpoint control.
#![no_std]

pub mod audio;
pub mod config;
pub mod error;
pub mod frequency;
pub mod sample_clock;
pub mod serial_sink;
pub mod speaker;
pub mod uac1;
pub mod usb_audio;

pub use audio::pipeline::{PipelineStats, TickOutcome, TickPipeline};
pub use config::{ClockConfig, EndpointConfig, InterfaceConfig, SetFailurePolicy, SpeakerConfig};
pub use error::ConfigurationError;
pub use frequency::FrequencyRegistry;
pub use sample_clock::{ClockState, ReloadTimer, SampleClock};
pub use serial_sink::{SampleSink, SerialSink};
pub use speaker::{Speaker, UsbEvent};
pub use uac1::{EndpointRole, PropertyBuffer, SampleRateControl};
pub use usb_audio::{FrameSource, PacketError, PacketFrameSource, PacketWriter, StereoFrame};

use static_assertions::const_assert;

// Stereo input -> mono serial output
pub const INPUT_CHANNEL_COUNT: usize = 2;
pub const SAMPLE_SIZE: usize = 2;
pub const FRAME_SIZE: usize = INPUT_CHANNEL_COUNT * SAMPLE_SIZE;

pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 8_000;

// Timer clocking of the reference board (16 MHz, Fcpu/8 into an 8 bit compare timer).
pub const BASE_CLOCK_HZ: u32 = 16_000_000;
pub const TIMER_PRESCALER: u32 = 8;
pub const TIMER_MAX_RELOAD: u32 = u8::MAX as u32;

pub const SERIAL_BAUD_RATE: u32 = 500_000;

pub const CONTROL_INTERFACE: u8 = 0;
pub const SPEAKER_STREAMING_INTERFACE: u8 = 1;
pub const MICROPHONE_STREAMING_INTERFACE: u8 = 2;

/// Speaker stream, host to device (OUT endpoint 3).
pub const SPEAKER_ENDPOINT_ADDRESS: u8 = 0x03;
/// Microphone stream, device to host (IN endpoint 4).
pub const MICROPHONE_ENDPOINT_ADDRESS: u8 = 0x84;

pub const USB_PACKET_SIZE: usize = 32;
pub const ENDPOINT_BANK_COUNT: u8 = 2;

// Room for all endpoint banks worth of samples, plus the slot the SPSC queue keeps free.
pub const FRAME_QUEUE_SIZE: usize = 64;

const_assert!(FRAME_QUEUE_SIZE > ENDPOINT_BANK_COUNT as usize * USB_PACKET_SIZE / SAMPLE_SIZE);
const_assert!(USB_PACKET_SIZE % FRAME_SIZE == 0);
// One 8N1 byte per sample
const_assert!(SERIAL_BAUD_RATE / 10 >= DEFAULT_SAMPLE_RATE_HZ);
const_assert!(
    sample_clock::reload_value(&ClockConfig::DEFAULT, DEFAULT_SAMPLE_RATE_HZ, TIMER_MAX_RELOAD).is_ok()
);

// Type definitions
pub type FrameQueue = heapless::spsc::Queue<i16, FRAME_QUEUE_SIZE>;
