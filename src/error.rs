use core::fmt;

/// The sample clock cannot be programmed for a requested frequency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigurationError {
    /// A frequency of 0 Hz has no tick period.
    ZeroFrequency,
    /// The timer clock divider is zero.
    ZeroPrescaler,
    /// The reload value would be zero or negative.
    FrequencyTooHigh { frequency_hz: u32 },
    /// The reload value exceeds the width of the timer.
    FrequencyTooLow { frequency_hz: u32, reload: u32 },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::ZeroFrequency => write!(f, "sampling frequency is zero"),
            ConfigurationError::ZeroPrescaler => write!(f, "timer prescaler is zero"),
            ConfigurationError::FrequencyTooHigh { frequency_hz } => {
                write!(f, "{} Hz is above the timer resolution", frequency_hz)
            }
            ConfigurationError::FrequencyTooLow { frequency_hz, reload } => {
                write!(f, "{} Hz needs reload value {}, beyond the timer width", frequency_hz, reload)
            }
        }
    }
}
