//! Static device configuration.
use embassy_usb::driver::EndpointAddress;
use embassy_usb::types::InterfaceNumber;

use crate::*;

/// Clocking of the sample timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockConfig {
    /// The timer's input clock in Hz, before prescaling.
    pub base_clock_hz: u32,
    /// The timer's clock divider.
    pub prescaler: u32,
}

impl ClockConfig {
    pub const DEFAULT: ClockConfig = ClockConfig {
        base_clock_hz: BASE_CLOCK_HZ,
        prescaler: TIMER_PRESCALER,
    };
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// An isochronous streaming endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointConfig {
    pub address: EndpointAddress,
    /// Maximum packet size in bytes.
    pub size: u16,
    /// Number of hardware buffer banks.
    pub banks: u8,
}

/// One audio function as seen by the host: a control interface and its streaming interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterfaceConfig {
    pub control_interface: InterfaceNumber,
    pub streaming_interface: InterfaceNumber,
    pub endpoint: EndpointConfig,
}

impl InterfaceConfig {
    /// The speaker stream (host to device).
    pub fn speaker() -> Self {
        InterfaceConfig {
            control_interface: InterfaceNumber(CONTROL_INTERFACE),
            streaming_interface: InterfaceNumber(SPEAKER_STREAMING_INTERFACE),
            endpoint: EndpointConfig {
                address: EndpointAddress::from(SPEAKER_ENDPOINT_ADDRESS),
                size: USB_PACKET_SIZE as u16,
                banks: ENDPOINT_BANK_COUNT,
            },
        }
    }

    /// The microphone stream (device to host).
    pub fn microphone() -> Self {
        InterfaceConfig {
            control_interface: InterfaceNumber(CONTROL_INTERFACE),
            streaming_interface: InterfaceNumber(MICROPHONE_STREAMING_INTERFACE),
            endpoint: EndpointConfig {
                address: EndpointAddress::from(MICROPHONE_ENDPOINT_ADDRESS),
                size: USB_PACKET_SIZE as u16,
                banks: ENDPOINT_BANK_COUNT,
            },
        }
    }
}

/// What a sampling frequency SET request reports when the sample clock cannot run at the new rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetFailurePolicy {
    /// Accept the request anyway. The registry keeps the requested value while the clock stays at the
    /// previous rate.
    #[default]
    Acknowledge,
    /// Refuse the request before anything changes. The host sees the request rejected.
    Reject,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpeakerConfig {
    pub clock: ClockConfig,
    /// Sampling frequency in Hz until the host sets one.
    pub initial_frequency_hz: u32,
    pub playback: InterfaceConfig,
    pub capture: InterfaceConfig,
    pub set_failure_policy: SetFailurePolicy,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        SpeakerConfig {
            clock: ClockConfig::DEFAULT,
            initial_frequency_hz: DEFAULT_SAMPLE_RATE_HZ,
            playback: InterfaceConfig::speaker(),
            capture: InterfaceConfig::microphone(),
            set_failure_policy: SetFailurePolicy::default(),
        }
    }
}
