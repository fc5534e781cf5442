//! MQTT topic mapping for the controller.
//!
//! ```text
//!  <base>config/<name>/set   ──▶ RemoteCommand::Set      (subscribed, QoS 1)
//!  <base>config/reset        ──▶ RemoteCommand::Reset    (payload "true" | "1")
//!  <base>config/<name>       ◀── pending config          (retained, QoS 1)
//!  <base>sensor-*/...        ◀── per-cycle readings      (QoS 1)
//!  <base>log/...             ◀── status, reason, heartbeat, startup
//!  <base>ventilation/state*  ◀── relay transitions       (retained, QoS 1)
//! ```
//!
//! The base topic always ends with `/`, so every topic below is a plain
//! concatenation.

use log::{debug, warn};

use crate::config::{ConfigField, normalize_base_topic};
use crate::sensors::SensorSnapshot;

use super::commands::RemoteCommand;
use super::config_store::ConfigStore;
use super::engine::DecisionResult;
use super::ports::{MessagingPort, QoS, TransportError};

const CONFIG_PREFIX: &str = "config/";
const SET_SUFFIX: &str = "/set";
const RESET_TOPIC: &str = "config/reset";

/// Parse an inbound message into a command.
///
/// Returns `None` for topics outside the base, unknown field names and
/// reset requests with any payload other than `true` or `1`.
pub fn parse_command(base_topic: &str, topic: &str, payload: &str) -> Option<RemoteCommand> {
    let rest = topic.strip_prefix(base_topic)?;
    if rest == RESET_TOPIC {
        return matches!(payload, "true" | "1").then_some(RemoteCommand::Reset);
    }
    let name = rest.strip_prefix(CONFIG_PREFIX)?.strip_suffix(SET_SUFFIX)?;
    let field = ConfigField::from_remote_name(name)?;
    Some(RemoteCommand::Set {
        field,
        raw: payload.to_string(),
    })
}

/// Topic builder and publisher bound to one base topic.
#[derive(Debug, Clone)]
pub struct RemoteControlSurface {
    base: String,
}

impl RemoteControlSurface {
    pub fn new(base_topic: &str) -> Self {
        Self {
            base: normalize_base_topic(base_topic),
        }
    }

    pub fn base_topic(&self) -> &str {
        &self.base
    }

    /// Absolute topic for a suffix below the base.
    pub fn topic(&self, suffix: &str) -> String {
        format!("{}{}", self.base, suffix)
    }

    pub fn config_topic(&self, field: ConfigField) -> String {
        self.topic(&format!("{CONFIG_PREFIX}{}", field.remote_name()))
    }

    pub fn set_topic(&self, field: ConfigField) -> String {
        self.topic(&format!("{CONFIG_PREFIX}{}{SET_SUFFIX}", field.remote_name()))
    }

    pub fn parse_command(&self, topic: &str, payload: &str) -> Option<RemoteCommand> {
        let cmd = parse_command(&self.base, topic, payload);
        if cmd.is_none() {
            debug!("Ignoring message on '{}'", topic);
        }
        cmd
    }

    // ── Inbound ───────────────────────────────────────────────

    /// Subscribe to every set topic and the reset topic.
    pub fn subscribe_all(&self, mqtt: &mut impl MessagingPort) -> Result<(), TransportError> {
        for field in ConfigField::ALL {
            mqtt.subscribe(&self.set_topic(field), QoS::AtLeastOnce)?;
        }
        mqtt.subscribe(&self.topic(RESET_TOPIC), QoS::AtLeastOnce)
    }

    // ── Outbound ──────────────────────────────────────────────

    /// Publish every pending field; a flag is cleared only on success.
    /// Returns the number of fields published.
    pub fn publish_pending_config(
        &self,
        store: &mut ConfigStore,
        mqtt: &mut impl MessagingPort,
    ) -> usize {
        let mut published = 0;
        for field in store.pending().fields() {
            let payload = store.config().get(field).to_string();
            match mqtt.publish(&self.config_topic(field), &payload, true, QoS::AtLeastOnce) {
                Ok(()) => {
                    store.clear_pending(field);
                    published += 1;
                }
                Err(e) => {
                    warn!("Publishing config '{}' failed: {}", field.remote_name(), e);
                }
            }
        }
        published
    }

    /// Sensor readings, dew points and the decision reason.
    pub fn publish_decision(
        &self,
        snap: &SensorSnapshot,
        result: &DecisionResult,
        mqtt: &mut impl MessagingPort,
    ) -> Result<(), TransportError> {
        let values = [
            ("sensor-inside/temperature", snap.temp_inside),
            ("sensor-inside/humidity", snap.humidity_inside),
            ("sensor-inside/dewpoint", result.dewpoint_inside),
            ("sensor-outside/temperature", snap.temp_outside),
            ("sensor-outside/humidity", snap.humidity_outside),
            ("sensor-outside/dewpoint", result.dewpoint_outside),
        ];
        for (suffix, value) in values {
            mqtt.publish(&self.topic(suffix), &format!("{value:.2}"), false, QoS::AtLeastOnce)?;
        }
        mqtt.publish(
            &self.topic("log/ventilatorStatusReason"),
            &result.reason.to_string(),
            false,
            QoS::AtLeastOnce,
        )
    }

    /// `sensors OK` or the fault detail.
    pub fn publish_sensor_status(
        &self,
        snap: &SensorSnapshot,
        mqtt: &mut impl MessagingPort,
    ) -> Result<(), TransportError> {
        let payload = match snap.fault {
            None => "sensors OK".to_string(),
            Some(fault) => format!("sensors show errors: {fault}"),
        };
        mqtt.publish(&self.topic("log/status"), &payload, false, QoS::AtLeastOnce)
    }

    /// Relay state as text and as number, both retained.
    pub fn publish_relay_state(
        &self,
        on: bool,
        mqtt: &mut impl MessagingPort,
    ) -> Result<(), TransportError> {
        let (text, num) = if on { ("ON", "1") } else { ("OFF", "0") };
        mqtt.publish(&self.topic("ventilation/state"), text, true, QoS::AtLeastOnce)?;
        mqtt.publish(&self.topic("ventilation/stateNum"), num, true, QoS::AtLeastOnce)
    }

    pub fn publish_heartbeat(
        &self,
        timestamp: &str,
        mqtt: &mut impl MessagingPort,
    ) -> Result<(), TransportError> {
        mqtt.publish(&self.topic("log/heartbeat"), timestamp, true, QoS::AtMostOnce)
    }

    pub fn publish_startup(
        &self,
        timestamp: &str,
        mqtt: &mut impl MessagingPort,
    ) -> Result<(), TransportError> {
        mqtt.publish(&self.topic("log/startup"), timestamp, true, QoS::AtLeastOnce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "dewpoint-ventilator/";

    #[test]
    fn set_topics_resolve_to_fields() {
        let cmd = parse_command(BASE, "dewpoint-ventilator/config/hysteresis/set", "2");
        assert_eq!(
            cmd,
            Some(RemoteCommand::Set { field: ConfigField::Hysteresis, raw: "2".into() })
        );
        let cmd = parse_command(
            BASE,
            "dewpoint-ventilator/config/overrideVentilationMinutes/set",
            "15",
        );
        assert!(matches!(
            cmd,
            Some(RemoteCommand::Set { field: ConfigField::OverrideMinutes, .. })
        ));
    }

    #[test]
    fn reset_requires_true_or_one() {
        assert_eq!(parse_command(BASE, "dewpoint-ventilator/config/reset", "true"), Some(RemoteCommand::Reset));
        assert_eq!(parse_command(BASE, "dewpoint-ventilator/config/reset", "1"), Some(RemoteCommand::Reset));
        assert_eq!(parse_command(BASE, "dewpoint-ventilator/config/reset", "yes"), None);
        assert_eq!(parse_command(BASE, "dewpoint-ventilator/config/reset", ""), None);
    }

    #[test]
    fn unknown_topics_are_ignored() {
        assert_eq!(parse_command(BASE, "dewpoint-ventilator/config/bogus/set", "1"), None);
        assert_eq!(parse_command(BASE, "other/config/hysteresis/set", "1"), None);
        assert_eq!(parse_command(BASE, "dewpoint-ventilator/config/hysteresis", "1"), None);
    }

    #[test]
    fn base_topic_is_normalised() {
        let surface = RemoteControlSurface::new("home/vent");
        assert_eq!(surface.base_topic(), "home/vent/");
        assert_eq!(surface.config_topic(ConfigField::Mode), "home/vent/config/mode");
        assert_eq!(
            surface.set_topic(ConfigField::MinHumidityForOverride),
            "home/vent/config/overrideMinHumidity/set"
        );
    }
}
