//! The sample clock: a compare-match timer that fires once per sample.
//!
//! The timer counts prescaled base clock cycles and raises its interrupt when the count reaches the
//! reload value, then starts over. For a sampling frequency `f` the reload value is
//! `base_clock / prescaler / f - 1`.
#[cfg(feature = "defmt")]
use defmt::{info, warn};
#[cfg(not(feature = "defmt"))]
use log::{info, warn};

use crate::config::ClockConfig;
use crate::error::ConfigurationError;

/// A hardware timer in periodic compare-match mode.
pub trait ReloadTimer {
    /// Largest reload value the counter can hold.
    const MAX_RELOAD: u32;

    /// Program the compare register. Takes effect at the next period at the latest.
    fn set_reload(&mut self, reload: u32);

    /// Start counting, with the compare-match interrupt enabled.
    fn enable(&mut self);

    /// Stop counting. No further interrupts fire.
    fn disable(&mut self);
}

/// Compute the reload value for a sampling frequency.
pub const fn reload_value(
    clock: &ClockConfig,
    frequency_hz: u32,
    max_reload: u32,
) -> Result<u32, ConfigurationError> {
    if frequency_hz == 0 {
        return Err(ConfigurationError::ZeroFrequency);
    }
    if clock.prescaler == 0 {
        return Err(ConfigurationError::ZeroPrescaler);
    }

    let period = clock.base_clock_hz / clock.prescaler / frequency_hz;

    // A period of one count gives a reload of zero, which the timer cannot use either.
    if period <= 1 {
        return Err(ConfigurationError::FrequencyTooHigh { frequency_hz });
    }

    let reload = period - 1;
    if reload > max_reload {
        return Err(ConfigurationError::FrequencyTooLow { frequency_hz, reload });
    }

    Ok(reload)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockState {
    Stopped,
    Running,
}

/// Drives a [`ReloadTimer`] at the configured sampling frequency.
pub struct SampleClock<T: ReloadTimer> {
    timer: T,
    clock: ClockConfig,
    state: ClockState,
    frequency_hz: Option<u32>,
    reload: Option<u32>,
}

impl<T: ReloadTimer> SampleClock<T> {
    /// Create a stopped, unconfigured sample clock.
    pub fn new(timer: T, clock: ClockConfig) -> Self {
        SampleClock {
            timer,
            clock,
            state: ClockState::Stopped,
            frequency_hz: None,
            reload: None,
        }
    }

    /// Reprogram the timer for a new sampling frequency and return the reload value.
    ///
    /// On error, neither the timer nor the clock state is touched. The run state is never changed.
    pub fn configure(&mut self, frequency_hz: u32) -> Result<u32, ConfigurationError> {
        let reload = match reload_value(&self.clock, frequency_hz, T::MAX_RELOAD) {
            Ok(reload) => reload,
            Err(e) => {
                warn!("Cannot clock samples at {} Hz: {}", frequency_hz, e);
                return Err(e);
            }
        };

        self.timer.set_reload(reload);
        self.frequency_hz = Some(frequency_hz);
        self.reload = Some(reload);

        info!("Sample clock at {} Hz (reload {})", frequency_hz, reload);
        Ok(reload)
    }

    /// Start ticking at the last configured frequency.
    pub fn start(&mut self) {
        if self.state == ClockState::Running {
            return;
        }

        self.timer.enable();
        self.state = ClockState::Running;
        info!("Sample clock started");
    }

    /// Stop ticking. A tick that is already running completes.
    pub fn stop(&mut self) {
        if self.state == ClockState::Stopped {
            return;
        }

        self.timer.disable();
        self.state = ClockState::Stopped;
        info!("Sample clock stopped");
    }

    /// Run the body of a timer interrupt.
    ///
    /// Returns `None` without running `tick` while the clock is stopped, which covers an interrupt that was
    /// already pending when [`SampleClock::stop`] was called.
    pub fn on_tick<R>(&self, tick: impl FnOnce() -> R) -> Option<R> {
        match self.state {
            ClockState::Running => Some(tick()),
            ClockState::Stopped => None,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// The frequency of the last successful [`SampleClock::configure`].
    pub fn frequency_hz(&self) -> Option<u32> {
        self.frequency_hz
    }

    pub fn reload(&self) -> Option<u32> {
        self.reload
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }
}
