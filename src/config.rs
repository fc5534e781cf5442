//! System configuration parameters
//!
//! Two kinds of configuration live here:
//!
//! - [`VentConfig`]: the nine tunables of the ventilation decision.
//!   Defaults are compiled in, values are overridden from NVS at boot and
//!   from MQTT `…/config/<name>/set` topics at runtime.
//! - [`DeviceConfig`]: build-time network credentials and loop timing.
//!
//! Every tunable is described once in the [`ConfigField`] table: its remote
//! name, its storage key, its accepted range.  Persistence, remote control
//! and pending-publish tracking all iterate that table instead of
//! hard-coding per-field code paths.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::sensors::Calibration;

// ---------------------------------------------------------------------------
// Operating mode
// ---------------------------------------------------------------------------

/// Requested operating mode.  `Auto` lets the dew-point logic decide;
/// `On`/`Off` force the relay unless the stale-ventilation override is
/// active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OperatingMode {
    #[default]
    #[serde(rename = "AUTO")]
    Auto,
    #[serde(rename = "ON")]
    On,
    #[serde(rename = "OFF")]
    Off,
}

impl OperatingMode {
    /// Parse the wire representation.  Anything other than the three exact
    /// keywords falls back to `Auto`.
    pub fn parse_or_auto(raw: &str) -> Self {
        match raw.trim() {
            "ON" => Self::On,
            "OFF" => Self::Off,
            "AUTO" => Self::Auto,
            other => {
                log::warn!("Unknown mode '{}', falling back to AUTO", other);
                Self::Auto
            }
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Ventilation tunables
// ---------------------------------------------------------------------------

/// Tunable parameters of the ventilation decision.
///
/// Serialised field names are the keys of the persisted JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VentConfig {
    /// Requested operating mode.
    pub mode: OperatingMode,
    /// Minimum dew-point difference (°C) at which ventilation switches on.
    #[serde(rename = "deltaDPmin")]
    pub min_dewpoint_delta: i32,
    /// Distance (°C) between switch-off and switch-on points.
    pub hysteresis: i32,
    /// Minimum indoor temperature (°C) for ventilation.
    #[serde(rename = "tempInside_min")]
    pub min_inside_temp: i32,
    /// Minimum outdoor temperature (°C) for ventilation.
    #[serde(rename = "tempOutside_min")]
    pub min_outside_temp: i32,
    /// Maximum outdoor temperature (°C) for ventilation.
    #[serde(rename = "tempOutside_max")]
    pub max_outside_temp: i32,
    /// Indoor humidity (%) at or above which a stale-ventilation override
    /// may be triggered.
    #[serde(rename = "min_humidity_for_override")]
    pub min_humidity_for_override: i32,
    /// Hours the relay may stay unchanged before the override kicks in.
    #[serde(rename = "max_hours_without_ventilation")]
    pub max_hours_without_ventilation: i32,
    /// Minutes an override keeps the ventilator running.
    #[serde(rename = "ventilation_override_minutes")]
    pub override_minutes: i32,
}

impl Default for VentConfig {
    fn default() -> Self {
        Self {
            mode: OperatingMode::Auto,
            min_dewpoint_delta: 5,
            hysteresis: 1,
            min_inside_temp: 10,
            min_outside_temp: -10,
            max_outside_temp: 25,
            min_humidity_for_override: 80,
            max_hours_without_ventilation: 12,
            override_minutes: 30,
        }
    }
}

impl VentConfig {
    /// Current value of a single field.
    pub fn get(&self, field: ConfigField) -> FieldValue {
        match field {
            ConfigField::Mode => FieldValue::Mode(self.mode),
            ConfigField::MinDewpointDelta => FieldValue::Int(self.min_dewpoint_delta),
            ConfigField::Hysteresis => FieldValue::Int(self.hysteresis),
            ConfigField::MinInsideTemp => FieldValue::Int(self.min_inside_temp),
            ConfigField::MinOutsideTemp => FieldValue::Int(self.min_outside_temp),
            ConfigField::MaxOutsideTemp => FieldValue::Int(self.max_outside_temp),
            ConfigField::MinHumidityForOverride => FieldValue::Int(self.min_humidity_for_override),
            ConfigField::MaxHoursWithoutVentilation => {
                FieldValue::Int(self.max_hours_without_ventilation)
            }
            ConfigField::OverrideMinutes => FieldValue::Int(self.override_minutes),
        }
    }

    /// Assign a single field.  The value must already be validated with
    /// [`ConfigField::validate`]; a value of the wrong kind is ignored.
    pub fn set(&mut self, field: ConfigField, value: FieldValue) {
        match (field, value) {
            (ConfigField::Mode, FieldValue::Mode(m)) => self.mode = m,
            (ConfigField::MinDewpointDelta, FieldValue::Int(v)) => self.min_dewpoint_delta = v,
            (ConfigField::Hysteresis, FieldValue::Int(v)) => self.hysteresis = v,
            (ConfigField::MinInsideTemp, FieldValue::Int(v)) => self.min_inside_temp = v,
            (ConfigField::MinOutsideTemp, FieldValue::Int(v)) => self.min_outside_temp = v,
            (ConfigField::MaxOutsideTemp, FieldValue::Int(v)) => self.max_outside_temp = v,
            (ConfigField::MinHumidityForOverride, FieldValue::Int(v)) => {
                self.min_humidity_for_override = v;
            }
            (ConfigField::MaxHoursWithoutVentilation, FieldValue::Int(v)) => {
                self.max_hours_without_ventilation = v;
            }
            (ConfigField::OverrideMinutes, FieldValue::Int(v)) => self.override_minutes = v,
            (f, v) => log::warn!("Ignoring {:?} for field {}", v, f.remote_name()),
        }
    }

    /// Stale-ventilation limit in milliseconds.
    pub fn max_without_ventilation_ms(&self) -> i64 {
        i64::from(self.max_hours_without_ventilation) * 60 * 60 * 1000
    }

    /// Override run time in milliseconds.
    pub fn override_ms(&self) -> i64 {
        i64::from(self.override_minutes) * 60 * 1000
    }
}

// ---------------------------------------------------------------------------
// Field table
// ---------------------------------------------------------------------------

/// Identifier of one tunable in [`VentConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConfigField {
    Mode = 0,
    MinDewpointDelta = 1,
    Hysteresis = 2,
    MinInsideTemp = 3,
    MinOutsideTemp = 4,
    MaxOutsideTemp = 5,
    MinHumidityForOverride = 6,
    MaxHoursWithoutVentilation = 7,
    OverrideMinutes = 8,
}

impl ConfigField {
    /// Every field, in publication order.
    pub const ALL: [ConfigField; 9] = [
        Self::Mode,
        Self::MinDewpointDelta,
        Self::Hysteresis,
        Self::MinInsideTemp,
        Self::MinOutsideTemp,
        Self::MaxOutsideTemp,
        Self::MinHumidityForOverride,
        Self::MaxHoursWithoutVentilation,
        Self::OverrideMinutes,
    ];

    /// Bit of this field in a pending-publish mask.
    pub const fn mask(self) -> u16 {
        1 << (self as u8)
    }

    /// Topic segment used under `<base>/config/`.
    pub const fn remote_name(self) -> &'static str {
        match self {
            Self::Mode => "mode",
            Self::MinDewpointDelta => "deltaDPmin",
            Self::Hysteresis => "hysteresis",
            Self::MinInsideTemp => "tempInside_min",
            Self::MinOutsideTemp => "tempOutside_min",
            Self::MaxOutsideTemp => "tempOutside_max",
            Self::MinHumidityForOverride => "overrideMinHumidity",
            Self::MaxHoursWithoutVentilation => "overrideMaxHoursWithoutVentilation",
            Self::OverrideMinutes => "overrideVentilationMinutes",
        }
    }

    /// Key in the persisted JSON document.
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::MinHumidityForOverride => "min_humidity_for_override",
            Self::MaxHoursWithoutVentilation => "max_hours_without_ventilation",
            Self::OverrideMinutes => "ventilation_override_minutes",
            other => other.remote_name(),
        }
    }

    /// Look a field up by its remote name.
    pub fn from_remote_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.remote_name() == name)
    }

    /// Accepted inclusive range for integer fields.
    pub const fn range(self) -> Option<(i32, i32)> {
        match self {
            Self::Mode => None,
            Self::MinDewpointDelta => Some((-20, 40)),
            Self::Hysteresis => Some((0, 20)),
            Self::MinInsideTemp | Self::MinOutsideTemp | Self::MaxOutsideTemp => Some((-40, 80)),
            Self::MinHumidityForOverride => Some((0, 100)),
            Self::MaxHoursWithoutVentilation => Some((0, 168)),
            Self::OverrideMinutes => Some((0, 1440)),
        }
    }

    /// Parse and validate a textual value received from the remote channel.
    ///
    /// Integer fields accept decimal text, truncated toward zero.  The mode
    /// never fails: unknown keywords become `AUTO`.
    pub fn parse(self, raw: &str) -> Result<FieldValue, ConfigError> {
        if self == Self::Mode {
            return Ok(FieldValue::Mode(OperatingMode::parse_or_auto(raw)));
        }
        let raw = raw.trim();
        let value = match raw.parse::<i32>() {
            Ok(v) => v,
            Err(_) => match raw.parse::<f32>() {
                Ok(f) if f.is_finite() => f.trunc() as i32,
                _ => return Err(ConfigError::ValidationFailed("value is not a number")),
            },
        };
        self.validate(FieldValue::Int(value))
    }

    /// Range-check a value for this field.
    pub fn validate(self, value: FieldValue) -> Result<FieldValue, ConfigError> {
        match (self.range(), value) {
            (None, FieldValue::Mode(_)) => Ok(value),
            (Some((lo, hi)), FieldValue::Int(v)) if (lo..=hi).contains(&v) => Ok(value),
            (Some(_), FieldValue::Int(_)) => Err(ConfigError::ValidationFailed(self.range_message())),
            _ => Err(ConfigError::ValidationFailed("wrong value kind for field")),
        }
    }

    const fn range_message(self) -> &'static str {
        match self {
            Self::Mode => "mode must be AUTO, ON or OFF",
            Self::MinDewpointDelta => "deltaDPmin must be -20..=40",
            Self::Hysteresis => "hysteresis must be 0..=20",
            Self::MinInsideTemp => "tempInside_min must be -40..=80",
            Self::MinOutsideTemp => "tempOutside_min must be -40..=80",
            Self::MaxOutsideTemp => "tempOutside_max must be -40..=80",
            Self::MinHumidityForOverride => "overrideMinHumidity must be 0..=100",
            Self::MaxHoursWithoutVentilation => "overrideMaxHoursWithoutVentilation must be 0..=168",
            Self::OverrideMinutes => "overrideVentilationMinutes must be 0..=1440",
        }
    }
}

/// A single tunable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Mode(OperatingMode),
    Int(i32),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mode(m) => write!(f, "{m}"),
            Self::Int(v) => write!(f, "{v}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Device configuration (build-time)
// ---------------------------------------------------------------------------

const DEFAULT_CLIENT_ID: &str = "dewpoint-vent-client";
const DEFAULT_BASE_TOPIC: &str = "dewpoint-ventilator/";

/// Network credentials and loop timing.
///
/// Credentials are injected at build time through `DEWVENT_*` environment
/// variables so they never live in the source tree.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    // --- Network ---
    pub wifi_ssid: Option<&'static str>,
    pub wifi_password: &'static str,
    /// Broker URL, e.g. `mqtt://broker.local:1883`.
    pub mqtt_url: Option<&'static str>,
    pub mqtt_user: Option<&'static str>,
    pub mqtt_password: Option<&'static str>,
    pub mqtt_client_id: &'static str,
    /// Topic prefix; always ends with `/` once normalised.
    pub base_topic: String,

    // --- Sensors ---
    pub inside_calibration: Calibration,
    pub outside_calibration: Calibration,

    // --- Timing ---
    /// Number of one-second idle steps between decision cycles.
    pub idle_steps: u32,
    /// Heartbeat period, in idle steps.
    pub heartbeat_every_steps: u32,
    /// Restart after this long without network.
    pub max_offline_ms: u64,
    /// Delay before restarting on a fatal fault.
    pub fatal_restart_delay_ms: u32,
    /// MQTT keep-alive interval.
    pub mqtt_keep_alive_secs: u64,
    /// MQTT network operation timeout.
    pub mqtt_timeout_ms: u64,
    /// Task watchdog timeout.
    pub watchdog_timeout_ms: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: None,
            wifi_password: "",
            mqtt_url: None,
            mqtt_user: None,
            mqtt_password: None,
            mqtt_client_id: DEFAULT_CLIENT_ID,
            base_topic: DEFAULT_BASE_TOPIC.to_string(),

            inside_calibration: Calibration::default(),
            outside_calibration: Calibration::default(),

            idle_steps: 60,                // ~1 cycle/min
            heartbeat_every_steps: 10,     // every 10 s
            max_offline_ms: 300_000,       // 5 min
            fatal_restart_delay_ms: 5_000,
            mqtt_keep_alive_secs: 20,
            mqtt_timeout_ms: 2_000,
            watchdog_timeout_ms: 8_000,
        }
    }
}

impl DeviceConfig {
    /// Build from `DEWVENT_*` build-time environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            wifi_ssid: option_env!("DEWVENT_WIFI_SSID"),
            wifi_password: option_env!("DEWVENT_WIFI_PASSWORD").unwrap_or(""),
            mqtt_url: option_env!("DEWVENT_MQTT_URL"),
            mqtt_user: option_env!("DEWVENT_MQTT_USER"),
            mqtt_password: option_env!("DEWVENT_MQTT_PASSWORD"),
            mqtt_client_id: option_env!("DEWVENT_MQTT_CLIENT_ID").unwrap_or(DEFAULT_CLIENT_ID),
            base_topic: normalize_base_topic(
                option_env!("DEWVENT_MQTT_BASE_TOPIC").unwrap_or(DEFAULT_BASE_TOPIC),
            ),
            ..defaults
        }
    }
}

/// Ensure a topic prefix ends with exactly one `/`.
pub fn normalize_base_topic(raw: &str) -> String {
    let mut topic = raw.trim().to_string();
    if !topic.ends_with('/') {
        topic.push('/');
    }
    topic
}
