//! The current sampling frequency, shared between the control request handler and the sample clock.
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Size of the sampling frequency control parameter [UAC 5.2.3.2.3.1].
pub const SAMPLING_FREQUENCY_SIZE: usize = 3;

/// Largest frequency the 3 byte parameter can carry.
pub const MAX_SAMPLING_FREQUENCY_HZ: u32 = 0xFF_FFFF;

/// Encode a frequency as the 3 byte little-endian control parameter.
pub fn encode_frequency(frequency_hz: u32) -> [u8; SAMPLING_FREQUENCY_SIZE] {
    [
        (frequency_hz & 0xFF) as u8,
        ((frequency_hz >> 8) & 0xFF) as u8,
        ((frequency_hz >> 16) & 0xFF) as u8,
    ]
}

/// Decode the 3 byte little-endian control parameter. Further bytes are ignored.
pub fn decode_frequency(data: &[u8]) -> Option<u32> {
    match data {
        [low, mid, high, ..] => Some((*low as u32) | (*mid as u32) << 8 | (*high as u32) << 16),
        _ => None,
    }
}

/// Holds the sampling frequency in Hz.
///
/// Writers are the control request handler and initialization. The sample clock only picks the value up
/// when it is reconfigured, never per tick.
pub struct FrequencyRegistry {
    frequency_hz: AtomicU32,
    changed: Signal<CriticalSectionRawMutex, u32>,
}

impl FrequencyRegistry {
    pub const fn new(frequency_hz: u32) -> Self {
        FrequencyRegistry {
            frequency_hz: AtomicU32::new(frequency_hz),
            changed: Signal::new(),
        }
    }

    pub fn get(&self) -> u32 {
        self.frequency_hz.load(Ordering::Relaxed)
    }

    /// Store a new frequency and wake a pending [`FrequencyRegistry::changed`].
    pub fn set(&self, frequency_hz: u32) {
        self.frequency_hz.store(frequency_hz, Ordering::Relaxed);
        self.changed.signal(frequency_hz);
    }

    /// Wait for the next change and return the latest frequency.
    ///
    /// Changes that happen while nobody waits collapse into one.
    pub async fn changed(&self) -> u32 {
        self.changed.wait().await
    }
}
