//! The speaker's shared state: sampling frequency, sample clock and streaming status.
//!
//! A [`Speaker`] is shared between the main loop (USB handler, lifecycle events) and the sample clock
//! interrupt, which calls [`Speaker::on_sample_tick`].
//!
//! Changing the sampling frequency writes the [`FrequencyRegistry`] first and reprograms the timer after. A
//! tick that lands between the two still runs at the previous reload value. That is at most one tick at
//! the old rate, and it is accepted: the two steps are not merged into one critical section.
use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "defmt")]
use defmt::info;
use embassy_sync::blocking_mutex::CriticalSectionMutex;
use embassy_usb::types::InterfaceNumber;
#[cfg(not(feature = "defmt"))]
use log::info;

use crate::audio::pipeline::{TickOutcome, TickPipeline};
use crate::config::SpeakerConfig;
use crate::error::ConfigurationError;
use crate::frequency::FrequencyRegistry;
use crate::sample_clock::{ClockState, ReloadTimer, SampleClock};
use crate::serial_sink::SampleSink;
use crate::uac1::SampleRateControl;
use crate::usb_audio::FrameSource;

/// Device lifecycle events delivered by the USB stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsbEvent {
    /// Attached to a host: the sample clock runs at its last configured frequency.
    Connect,
    /// Detached: the sample clock stops.
    Disconnect,
    /// The host selected (or deselected) a configuration. Endpoints become active or inactive.
    ConfigurationChanged { configured: bool },
    /// The bus went idle, or resumed. Without VBUS detection this is also how a pulled cable shows up.
    /// The clock stops while suspended; the configuration survives.
    Suspended { suspended: bool },
}

pub struct Speaker<T: ReloadTimer> {
    config: SpeakerConfig,
    frequency: FrequencyRegistry,
    clock: CriticalSectionMutex<RefCell<SampleClock<T>>>,
    configured: AtomicBool,
    playback_active: AtomicBool,
}

impl<T: ReloadTimer> Speaker<T> {
    /// Set up the speaker with its sample clock programmed for the initial frequency. The clock stays
    /// stopped until [`UsbEvent::Connect`].
    pub fn new(config: SpeakerConfig, timer: T) -> Result<Self, ConfigurationError> {
        let mut clock = SampleClock::new(timer, config.clock);
        clock.configure(config.initial_frequency_hz)?;

        Ok(Speaker {
            config,
            frequency: FrequencyRegistry::new(config.initial_frequency_hz),
            clock: CriticalSectionMutex::new(RefCell::new(clock)),
            configured: AtomicBool::new(false),
            playback_active: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &SpeakerConfig {
        &self.config
    }

    pub fn registry(&self) -> &FrequencyRegistry {
        &self.frequency
    }

    /// The control request handler for the sampling frequency endpoint controls.
    pub fn control(&self) -> SampleRateControl<'_, T> {
        SampleRateControl::new(self)
    }

    pub fn frequency_hz(&self) -> u32 {
        self.frequency.get()
    }

    /// Store a new sampling frequency and reprogram the sample clock for it.
    ///
    /// The registry holds the new value even when the clock rejects it.
    pub fn set_sample_rate(&self, frequency_hz: u32) -> Result<u32, ConfigurationError> {
        self.frequency.set(frequency_hz);
        self.clock.lock(|clock| clock.borrow_mut().configure(frequency_hz))
    }

    pub fn handle_event(&self, event: UsbEvent) {
        match event {
            UsbEvent::Connect => {
                info!("Connected");
                self.clock.lock(|clock| clock.borrow_mut().start());
            }
            UsbEvent::Disconnect => {
                info!("Disconnected");
                self.clock.lock(|clock| clock.borrow_mut().stop());
                self.configured.store(false, Ordering::Relaxed);
                self.playback_active.store(false, Ordering::Relaxed);
            }
            UsbEvent::ConfigurationChanged { configured } => {
                info!("Configured: {}", configured);
                self.configured.store(configured, Ordering::Relaxed);
                if !configured {
                    self.playback_active.store(false, Ordering::Relaxed);
                }
            }
            UsbEvent::Suspended { suspended } => {
                info!("Suspended: {}", suspended);
                self.clock.lock(|clock| {
                    let mut clock = clock.borrow_mut();
                    if suspended {
                        clock.stop();
                    } else {
                        clock.start();
                    }
                });
            }
        }
    }

    /// Track the alternate setting of the streaming interfaces.
    ///
    /// Alternate setting 0 of the playback interface is the zero-bandwidth setting, any other one streams.
    pub fn set_streaming_alternate(&self, interface: InterfaceNumber, alternate_setting: u8) {
        if interface != self.config.playback.streaming_interface {
            return;
        }

        let active = alternate_setting != 0;
        info!("Playback stream {}", if active { "started" } else { "stopped" });
        self.playback_active.store(active, Ordering::Relaxed);
    }

    /// Forget the streaming state after a bus reset.
    pub fn reset(&self) {
        self.configured.store(false, Ordering::Relaxed);
        self.playback_active.store(false, Ordering::Relaxed);
    }

    /// Whether the host is streaming to the playback endpoint.
    pub fn is_streaming(&self) -> bool {
        self.configured.load(Ordering::Relaxed) && self.playback_active.load(Ordering::Relaxed)
    }

    pub fn clock_state(&self) -> ClockState {
        self.clock.lock(|clock| clock.borrow().state())
    }

    /// The reload value the timer is programmed with.
    pub fn reload(&self) -> Option<u32> {
        self.clock.lock(|clock| clock.borrow().reload())
    }

    /// Body of the sample clock interrupt.
    ///
    /// Returns `None` when the clock is stopped. While the host is not streaming, the frame source is left
    /// alone and the tick counts as [`TickOutcome::FrameUnavailable`].
    pub fn on_sample_tick<S: FrameSource, K: SampleSink>(
        &self,
        pipeline: &mut TickPipeline<S, K>,
    ) -> Option<TickOutcome> {
        let streaming = self.is_streaming();

        self.clock.lock(|clock| {
            clock.borrow().on_tick(|| {
                if streaming {
                    pipeline.run()
                } else {
                    TickOutcome::FrameUnavailable
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_clock::tests::FakeTimer;
    use crate::usb_audio::StereoFrame;

    struct ConstantSource(StereoFrame);

    impl FrameSource for ConstantSource {
        fn is_frame_available(&mut self) -> bool {
            true
        }

        fn read_frame(&mut self) -> StereoFrame {
            self.0
        }
    }

    #[derive(Default)]
    struct CountingSink {
        written: usize,
    }

    impl SampleSink for CountingSink {
        fn is_ready(&mut self) -> bool {
            true
        }

        fn write_sample(&mut self, _sample: u8) {
            self.written += 1;
        }
    }

    fn speaker() -> Speaker<FakeTimer> {
        Speaker::new(SpeakerConfig::default(), FakeTimer::default()).unwrap()
    }

    fn pipeline() -> TickPipeline<ConstantSource, CountingSink> {
        TickPipeline::new(
            ConstantSource(StereoFrame {
                left: 0x4000,
                right: 0x2000,
            }),
            CountingSink::default(),
        )
    }

    fn stream(speaker: &Speaker<FakeTimer>) {
        speaker.handle_event(UsbEvent::Connect);
        speaker.handle_event(UsbEvent::ConfigurationChanged { configured: true });
        speaker.set_streaming_alternate(speaker.config().playback.streaming_interface, 1);
    }

    #[test]
    fn new_programs_the_initial_frequency_and_stays_stopped() {
        let speaker = speaker();

        assert_eq!(speaker.frequency_hz(), 8_000);
        assert_eq!(speaker.reload(), Some(249));
        assert_eq!(speaker.clock_state(), ClockState::Stopped);
        assert!(!speaker.is_streaming());
    }

    #[test]
    fn unrepresentable_initial_frequency_is_rejected() {
        let config = SpeakerConfig {
            initial_frequency_hz: 1_000,
            ..SpeakerConfig::default()
        };

        assert!(matches!(
            Speaker::new(config, FakeTimer::default()),
            Err(ConfigurationError::FrequencyTooLow { frequency_hz: 1_000, .. })
        ));
    }

    #[test]
    fn connect_and_disconnect_drive_the_clock() {
        let speaker = speaker();

        speaker.handle_event(UsbEvent::Connect);
        assert_eq!(speaker.clock_state(), ClockState::Running);

        speaker.handle_event(UsbEvent::Disconnect);
        assert_eq!(speaker.clock_state(), ClockState::Stopped);
    }

    #[test]
    fn connect_uses_the_last_configured_frequency() {
        let speaker = speaker();
        speaker.set_sample_rate(16_000).unwrap();

        speaker.handle_event(UsbEvent::Connect);

        assert_eq!(speaker.reload(), Some(124));
        assert_eq!(speaker.clock_state(), ClockState::Running);
    }

    #[test]
    fn configuration_change_keeps_the_sample_rate() {
        let speaker = speaker();
        speaker.set_sample_rate(11_025).unwrap();

        speaker.handle_event(UsbEvent::ConfigurationChanged { configured: true });
        speaker.handle_event(UsbEvent::ConfigurationChanged { configured: false });

        assert_eq!(speaker.frequency_hz(), 11_025);
        assert_eq!(speaker.reload(), Some(180));
    }

    #[test]
    fn failed_rate_change_keeps_the_clock() {
        let speaker = speaker();

        assert!(speaker.set_sample_rate(2_000_000).is_err());

        assert_eq!(speaker.frequency_hz(), 2_000_000);
        assert_eq!(speaker.reload(), Some(249));
    }

    #[test]
    fn stopped_clock_runs_no_pipeline() {
        let speaker = speaker();
        let mut pipeline = pipeline();

        assert_eq!(speaker.on_sample_tick(&mut pipeline), None);
        assert_eq!(pipeline.sink().written, 0);
    }

    #[test]
    fn only_the_streaming_interface_feeds_the_sink() {
        let speaker = speaker();
        let mut pipeline = pipeline();

        speaker.handle_event(UsbEvent::Connect);
        assert_eq!(speaker.on_sample_tick(&mut pipeline), Some(TickOutcome::FrameUnavailable));

        speaker.handle_event(UsbEvent::ConfigurationChanged { configured: true });
        speaker.set_streaming_alternate(speaker.config().capture.streaming_interface, 1);
        assert_eq!(speaker.on_sample_tick(&mut pipeline), Some(TickOutcome::FrameUnavailable));

        speaker.set_streaming_alternate(speaker.config().playback.streaming_interface, 1);
        // (0x40 + 0x20) >> 1 = 0x30
        assert_eq!(speaker.on_sample_tick(&mut pipeline), Some(TickOutcome::Emitted(0xB0)));

        speaker.set_streaming_alternate(speaker.config().playback.streaming_interface, 0);
        assert_eq!(speaker.on_sample_tick(&mut pipeline), Some(TickOutcome::FrameUnavailable));
        assert_eq!(pipeline.sink().written, 1);
    }

    #[test]
    fn suspend_pauses_the_clock_and_keeps_the_stream() {
        let speaker = speaker();
        let mut pipeline = pipeline();
        stream(&speaker);

        speaker.handle_event(UsbEvent::Suspended { suspended: true });
        assert_eq!(speaker.clock_state(), ClockState::Stopped);
        assert_eq!(speaker.on_sample_tick(&mut pipeline), None);

        speaker.handle_event(UsbEvent::Suspended { suspended: false });
        assert_eq!(speaker.clock_state(), ClockState::Running);
        assert!(speaker.is_streaming());
        assert_eq!(speaker.on_sample_tick(&mut pipeline), Some(TickOutcome::Emitted(0xB0)));
    }

    #[test]
    fn rate_changes_reach_registry_listeners() {
        let speaker = speaker();

        speaker.set_sample_rate(16_000).unwrap();

        assert_eq!(embassy_futures::block_on(speaker.registry().changed()), 16_000);
    }

    #[test]
    fn disconnect_and_reset_end_the_stream() {
        let speaker = speaker();

        stream(&speaker);
        assert!(speaker.is_streaming());
        speaker.handle_event(UsbEvent::Disconnect);
        assert!(!speaker.is_streaming());

        stream(&speaker);
        speaker.reset();
        assert!(!speaker.is_streaming());
        assert_eq!(speaker.clock_state(), ClockState::Running);
    }
}
