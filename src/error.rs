//! Unified error types for the ventilation firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! control loop's error handling uniform.  All variants are `Copy`.
//!
//! | Variant               | Policy                                    |
//! |-----------------------|-------------------------------------------|
//! | `Sensor`              | fatal: publish, wait, restart             |
//! | `ConnectivityTimeout` | fatal: restart (self-heals a hung stack)  |
//! | `Transport`           | logged, retried next cycle                |
//! | `Persistence`         | logged, defaults used per field           |
//! | `Config`              | logged, value rejected                    |

use core::fmt;

use crate::app::ports::{ConfigError, StorageError, TransportError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// One or both climate sensors are unreadable or out of range.
    Sensor(SensorFault),
    /// The broker or network is unreachable.
    Transport(TransportError),
    /// Non-volatile storage is unavailable or corrupt.
    Persistence(StorageError),
    /// A configuration value was rejected.
    Config(ConfigError),
    /// No network for longer than the configured limit.
    ConnectivityTimeout { offline_secs: u64 },
}

impl Error {
    /// Fatal errors end the process; the device restarts.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Sensor(_) | Self::ConnectivityTimeout { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Persistence(e) => write!(f, "persistence: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::ConnectivityTimeout { offline_secs } => {
                write!(f, "no network for {offline_secs} s")
            }
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

/// Which of the two sensors failed validation.
///
/// `Display` renders the published error detail: one fixed phrase per
/// failing sensor, inside first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorFault {
    pub inside: bool,
    pub outside: bool,
}

impl SensorFault {
    /// `None` when both sensors are valid.
    pub const fn from_flags(inside: bool, outside: bool) -> Option<Self> {
        if inside || outside {
            Some(Self { inside, outside })
        } else {
            None
        }
    }
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inside {
            f.write_str("Error reading from sensor inside. ")?;
        }
        if self.outside {
            f.write_str("Error reading from sensor outside. ")?;
        }
        Ok(())
    }
}

impl From<SensorFault> for Error {
    fn from(e: SensorFault) -> Self {
        Self::Sensor(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Persistence(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Storage(s) => Self::Persistence(s),
            other => Self::Config(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_detail_is_order_stable() {
        let both = SensorFault::from_flags(true, true).unwrap();
        assert_eq!(
            both.to_string(),
            "Error reading from sensor inside. Error reading from sensor outside. "
        );
        let outside = SensorFault::from_flags(false, true).unwrap();
        assert_eq!(outside.to_string(), "Error reading from sensor outside. ");
        assert!(SensorFault::from_flags(false, false).is_none());
    }

    #[test]
    fn only_sensor_and_connectivity_are_fatal() {
        assert!(Error::from(SensorFault { inside: true, outside: false }).is_fatal());
        assert!(Error::ConnectivityTimeout { offline_secs: 301 }.is_fatal());
        assert!(!Error::from(TransportError::PublishFailed).is_fatal());
        assert!(!Error::from(StorageError::IoError).is_fatal());
        assert!(!Error::from(ConfigError::Corrupted).is_fatal());
    }

    #[test]
    fn config_storage_errors_map_to_persistence() {
        assert_eq!(
            Error::from(ConfigError::Storage(StorageError::Full)),
            Error::Persistence(StorageError::Full)
        );
    }
}
