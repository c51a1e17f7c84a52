//! USB Audio Class 1.0 sampling frequency control.
//!
//! Handles GET_CUR/SET_CUR of the sampling frequency control [UAC 5.2.3.2.3.1] on the two streaming
//! endpoints. Both endpoints share one frequency. Everything else is left to other handlers.
//!
//! The parameter is 3 bytes, little-endian, in Hz.
use class_codes::*;
#[cfg(feature = "defmt")]
use defmt::{trace, warn};
use embassy_usb::control::{InResponse, OutResponse, Recipient, Request, RequestType};
use embassy_usb::driver::EndpointAddress;
use embassy_usb::types::InterfaceNumber;
use embassy_usb::Handler;
#[cfg(not(feature = "defmt"))]
use log::{trace, warn};

use crate::config::{InterfaceConfig, SetFailurePolicy, SpeakerConfig};
use crate::frequency::{decode_frequency, encode_frequency, SAMPLING_FREQUENCY_SIZE};
use crate::sample_clock::{reload_value, ReloadTimer};
use crate::speaker::{Speaker, UsbEvent};

mod class_codes;

/// The streaming endpoints of the device, by direction of the audio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EndpointRole {
    /// Host to device (speaker).
    Playback,
    /// Device to host (microphone).
    Capture,
}

impl EndpointRole {
    pub const ALL: [EndpointRole; 2] = [EndpointRole::Playback, EndpointRole::Capture];

    /// The audio function this role belongs to.
    pub fn interface(self, config: &SpeakerConfig) -> &InterfaceConfig {
        match self {
            EndpointRole::Playback => &config.playback,
            EndpointRole::Capture => &config.capture,
        }
    }
}

/// Data stage of a property request.
///
/// For SET requests, `data[..length]` holds the parameter sent by the host. For GET requests, `length` is
/// the most the host accepts, and is replaced by the number of bytes written to `data`.
pub struct PropertyBuffer<'b> {
    pub data: &'b mut [u8],
    pub length: u16,
}

/// Answers sampling frequency requests for a [`Speaker`], and forwards USB lifecycle events to it.
pub struct SampleRateControl<'d, T: ReloadTimer> {
    speaker: &'d Speaker<T>,
}

impl<'d, T: ReloadTimer> SampleRateControl<'d, T> {
    pub fn new(speaker: &'d Speaker<T>) -> Self {
        SampleRateControl { speaker }
    }

    /// Which streaming endpoint an address refers to, if any.
    pub fn endpoint_role(&self, endpoint_address: u8) -> Option<EndpointRole> {
        let address = EndpointAddress::from(endpoint_address);
        let config = self.speaker.config();

        EndpointRole::ALL
            .into_iter()
            .find(|role| role.interface(config).endpoint.address == address)
    }

    /// Get or set a property of a streaming endpoint.
    ///
    /// Without a `buffer`, only reports whether the request is supported; nothing is read or written.
    ///
    /// Returns `false` for requests this handler does not own: an unknown endpoint, a control other than the
    /// sampling frequency, or a request other than GET_CUR/SET_CUR. Supported requests return `true`,
    /// unless a SET is refused under [`SetFailurePolicy::Reject`].
    pub fn get_set_endpoint_property(
        &self,
        endpoint_address: u8,
        request: u8,
        control_selector: u8,
        buffer: Option<&mut PropertyBuffer<'_>>,
    ) -> bool {
        if self.endpoint_role(endpoint_address).is_none() {
            trace!("Unhandled endpoint request for endpoint {}", endpoint_address);
            return false;
        }

        if control_selector != SAMPLING_FREQ_CONTROL {
            trace!(
                "Unsupported endpoint request for control selector {} on endpoint {}",
                control_selector,
                endpoint_address
            );
            return false;
        }

        match request {
            SET_CUR => match buffer {
                Some(buffer) => self.set_sampling_frequency(endpoint_address, buffer),
                None => true,
            },
            GET_CUR => {
                if let Some(buffer) = buffer {
                    self.get_sampling_frequency(endpoint_address, buffer);
                }
                true
            }
            _ => false,
        }
    }

    /// Get or set a property of an audio control entity. The device has no entities with properties.
    pub fn get_set_interface_property(
        &self,
        _interface: u8,
        _entity: u8,
        _request: u8,
        _parameter: u16,
        _buffer: Option<&mut PropertyBuffer<'_>>,
    ) -> bool {
        false
    }

    fn set_sampling_frequency(&self, endpoint_address: u8, buffer: &PropertyBuffer<'_>) -> bool {
        let length = usize::from(buffer.length).min(buffer.data.len());

        let frequency_hz = match decode_frequency(&buffer.data[..length]) {
            Some(frequency_hz) => frequency_hz,
            None => {
                warn!("Sampling frequency SET with {} bytes ignored", length);
                return true;
            }
        };

        if self.speaker.config().set_failure_policy == SetFailurePolicy::Reject {
            let clock = &self.speaker.config().clock;
            if let Err(e) = reload_value(clock, frequency_hz, T::MAX_RELOAD) {
                warn!("Refused sample rate {} Hz: {}", frequency_hz, e);
                return false;
            }
        }

        trace!("Set endpoint {} sample rate to {} Hz", endpoint_address, frequency_hz);

        // The clock logs a rejected frequency. The request still counts as handled.
        let _ = self.speaker.set_sample_rate(frequency_hz);
        true
    }

    fn get_sampling_frequency(&self, endpoint_address: u8, buffer: &mut PropertyBuffer<'_>) {
        if usize::from(buffer.length) < SAMPLING_FREQUENCY_SIZE || buffer.data.len() < SAMPLING_FREQUENCY_SIZE {
            warn!("Sampling frequency GET with room for {} bytes", buffer.length);
            buffer.length = 0;
            return;
        }

        let frequency_hz = self.speaker.frequency_hz();
        buffer.data[..SAMPLING_FREQUENCY_SIZE].copy_from_slice(&encode_frequency(frequency_hz));
        buffer.length = SAMPLING_FREQUENCY_SIZE as u16;

        trace!("Got endpoint {} sample rate: {} Hz", endpoint_address, frequency_hz);
    }
}

impl<'d, T: ReloadTimer> Handler for SampleRateControl<'d, T> {
    fn enabled(&mut self, enabled: bool) {
        let event = if enabled { UsbEvent::Connect } else { UsbEvent::Disconnect };
        self.speaker.handle_event(event);
    }

    fn reset(&mut self) {
        self.speaker.reset();
    }

    // Also the only sign of a pulled cable on boards without VBUS detection.
    fn suspended(&mut self, suspended: bool) {
        self.speaker.handle_event(UsbEvent::Suspended { suspended });
    }

    fn configured(&mut self, configured: bool) {
        self.speaker.handle_event(UsbEvent::ConfigurationChanged { configured });
    }

    fn set_alternate_setting(&mut self, iface: InterfaceNumber, alternate_setting: u8) {
        self.speaker.set_streaming_alternate(iface, alternate_setting);
    }

    // Handle control set requests.
    fn control_out(&mut self, req: Request, data: &[u8]) -> Option<OutResponse> {
        if req.request_type != RequestType::Class {
            return None;
        }

        match req.recipient {
            Recipient::Endpoint => {
                let endpoint_address = req.index as u8;
                let control_selector = (req.value >> 8) as u8;

                let mut parameter = [0u8; SAMPLING_FREQUENCY_SIZE];
                let length = data.len().min(parameter.len());
                parameter[..length].copy_from_slice(&data[..length]);

                let mut buffer = PropertyBuffer {
                    data: &mut parameter,
                    length: length as u16,
                };

                if self.get_set_endpoint_property(endpoint_address, req.request, control_selector, Some(&mut buffer)) {
                    Some(OutResponse::Accepted)
                } else if self.get_set_endpoint_property(endpoint_address, req.request, control_selector, None) {
                    // Supported, but refused.
                    Some(OutResponse::Rejected)
                } else {
                    None
                }
            }
            Recipient::Interface => {
                let interface = req.index as u8;
                let entity = (req.index >> 8) as u8;

                match self.get_set_interface_property(interface, entity, req.request, req.value, None) {
                    true => Some(OutResponse::Accepted),
                    false => None,
                }
            }
            _ => None,
        }
    }

    // Handle control get requests.
    fn control_in<'a>(&'a mut self, req: Request, buf: &'a mut [u8]) -> Option<InResponse<'a>> {
        if req.request_type != RequestType::Class || req.recipient != Recipient::Endpoint {
            return None;
        }

        let endpoint_address = req.index as u8;
        let control_selector = (req.value >> 8) as u8;

        let mut buffer = PropertyBuffer {
            data: &mut buf[..],
            length: req.length,
        };

        if !self.get_set_endpoint_property(endpoint_address, req.request, control_selector, Some(&mut buffer)) {
            return None;
        }

        let length = usize::from(buffer.length);
        if length == 0 {
            return Some(InResponse::Rejected);
        }

        Some(InResponse::Accepted(&buf[..length]))
    }
}
