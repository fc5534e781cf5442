//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, relay, broker, storage, event sinks) implement
//! these traits.  The [`AppService`](super::service::AppService) consumes
//! them via generics, so the domain core never touches hardware directly.

use core::fmt;

use crate::sensors::SensorSnapshot;

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One combined humidity/temperature sensor.
///
/// Implementations return `f32::NAN` on a transient read failure; no unit
/// conversion happens downstream.
pub trait ClimateSensor {
    /// Relative humidity (%).
    fn read_humidity(&mut self) -> f32;

    /// Air temperature (°C).
    fn read_temperature(&mut self) -> f32;
}

/// Read-side port: the domain calls this once per cycle.
pub trait SensorPort {
    /// Read both sensors and return a validated snapshot.
    fn read_snapshot(&mut self) -> SensorSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Relay port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// The single ventilation relay.
pub trait RelayPort {
    /// Energise (`true`) or release (`false`) the relay.
    fn set_relay(&mut self, on: bool);

    /// Last commanded state.
    fn is_relay_on(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Messaging port (driven adapter: domain ↔ MQTT broker)
// ───────────────────────────────────────────────────────────────

/// Delivery guarantee requested for a publication or subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QoS {
    AtMostOnce,
    AtLeastOnce,
}

/// Publish/subscribe access to the remote channel.
///
/// A successful `publish` means the transport accepted the message; this
/// is the confirmation the pending-publish flags wait for.
pub trait MessagingPort {
    /// Whether a broker session is currently established.
    fn is_connected(&self) -> bool;

    fn publish(
        &mut self,
        topic: &str,
        payload: &str,
        retained: bool,
        qos: QoS,
    ) -> Result<(), TransportError>;

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// Keys are namespaced to prevent collisions between subsystems.  Writes
/// MUST be atomic: no partial documents on power loss.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from configuration loading, saving and remote updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored document is not a JSON object.
    Corrupted,
    /// A value failed parsing or range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// The backing store rejected the write.
    Storage(StorageError),
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Caller buffer cannot hold the stored value.
    BufferTooSmall,
    /// Generic I/O error.
    IoError,
}

/// Errors from [`MessagingPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// No broker session.
    NotConnected,
    /// The client refused or failed to enqueue the publication.
    PublishFailed,
    /// Subscription request failed.
    SubscribeFailed,
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "broker not connected"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
        }
    }
}

impl core::error::Error for ConfigError {}
impl core::error::Error for StorageError {}
impl core::error::Error for TransportError {}
