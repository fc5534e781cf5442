//! Inbound commands to the application service.
//!
//! Produced by the [`RemoteControlSurface`](super::remote::RemoteControlSurface)
//! from MQTT messages and interpreted by the
//! [`AppService`](super::service::AppService).

use crate::config::ConfigField;

/// A configuration request from the remote channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Set one tunable from its textual wire value.
    Set { field: ConfigField, raw: String },

    /// Restore every tunable to its compiled-in default.
    Reset,
}
