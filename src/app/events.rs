//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; the firmware logs them to serial.

use crate::config::{ConfigField, FieldValue};
use crate::error::SensorFault;

use super::engine::DecisionReason;
use super::ports::{ConfigError, TransportError};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service finished booting with the given relay state.
    Started { relay_on: bool },

    /// One decision cycle completed.
    Decision(DecisionSummary),

    /// A sensor snapshot failed validation.
    SensorFault(SensorFault),

    /// A tunable was changed remotely.
    ConfigChanged { field: ConfigField, value: FieldValue },

    /// A remote value was rejected or could not be persisted.
    ConfigRejected { field: ConfigField, error: ConfigError },

    /// All tunables were restored to defaults.
    ConfigReset,

    /// A publication failed and will be retried.
    PublishFailed(TransportError),
}

/// Compact record of one decision, suitable for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionSummary {
    pub relay_on: bool,
    pub relay_changed: bool,
    pub delta_dewpoint: f32,
    pub reason: DecisionReason,
}
