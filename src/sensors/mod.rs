//! Sensor subsystem — the DHT22 driver and the aggregating [`SensorHub`].
//!
//! The hub owns the inside and outside [`ClimateSensor`]s and produces a
//! validated [`SensorSnapshot`] once per decision cycle.  Validation is
//! per sensor and independent; a snapshot with any fault carries a
//! [`SensorFault`] and must not be used for a relay decision.

pub mod dht22;

use log::{debug, warn};

use crate::app::ports::{ClimateSensor, SensorPort};
use crate::error::SensorFault;

/// Plausible humidity range (%).
const HUMIDITY_MIN: f32 = 1.0;
const HUMIDITY_MAX: f32 = 100.0;
/// Plausible temperature range (°C), matching the DHT22 datasheet.
const TEMP_MIN_C: f32 = -40.0;
const TEMP_MAX_C: f32 = 80.0;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A point-in-time reading of both sensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSnapshot {
    pub humidity_inside: f32,
    pub temp_inside: f32,
    pub humidity_outside: f32,
    pub temp_outside: f32,
    /// Set when either sensor failed validation.
    pub fault: Option<SensorFault>,
}

impl SensorSnapshot {
    /// Build a snapshot and validate both readings.
    pub fn new(humidity_inside: f32, temp_inside: f32, humidity_outside: f32, temp_outside: f32) -> Self {
        let fault = SensorFault::from_flags(
            !reading_is_valid(humidity_inside, temp_inside),
            !reading_is_valid(humidity_outside, temp_outside),
        );
        Self {
            humidity_inside,
            temp_inside,
            humidity_outside,
            temp_outside,
            fault,
        }
    }

    /// Both sensors produced plausible values.
    pub fn is_valid(&self) -> bool {
        self.fault.is_none()
    }

    /// Human-readable failure description; empty when valid.
    pub fn error_detail(&self) -> String {
        self.fault.map(|f| f.to_string()).unwrap_or_default()
    }
}

/// A single sensor's humidity/temperature pair is usable.
///
/// NaN fails every comparison, so it is rejected explicitly first.
pub fn reading_is_valid(humidity: f32, temperature: f32) -> bool {
    !humidity.is_nan()
        && !temperature.is_nan()
        && (HUMIDITY_MIN..=HUMIDITY_MAX).contains(&humidity)
        && (TEMP_MIN_C..=TEMP_MAX_C).contains(&temperature)
}

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

/// Additive correction for an individual sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Calibration {
    pub temp_offset_c: f32,
    pub humidity_offset_pct: f32,
}

// ---------------------------------------------------------------------------
// Hub
// ---------------------------------------------------------------------------

/// Aggregates the inside and outside sensors into one snapshot.
pub struct SensorHub<I, O> {
    inside: I,
    outside: O,
    inside_cal: Calibration,
    outside_cal: Calibration,
}

impl<I: ClimateSensor, O: ClimateSensor> SensorHub<I, O> {
    pub fn new(inside: I, outside: O) -> Self {
        Self {
            inside,
            outside,
            inside_cal: Calibration::default(),
            outside_cal: Calibration::default(),
        }
    }

    /// Apply per-sensor correction offsets before validation.
    pub fn with_calibration(mut self, inside: Calibration, outside: Calibration) -> Self {
        self.inside_cal = inside;
        self.outside_cal = outside;
        self
    }

    fn read_one(sensor: &mut impl ClimateSensor, cal: Calibration, label: &str) -> (f32, f32) {
        let humidity = sensor.read_humidity() + cal.humidity_offset_pct;
        let temperature = sensor.read_temperature() + cal.temp_offset_c;
        if reading_is_valid(humidity, temperature) {
            debug!("sensor {} OK: {:.1}% {:.1}\u{00b0}C", label, humidity, temperature);
        } else {
            warn!(
                "Error reading from sensor {}: humidity={}% temperature={}\u{00b0}C",
                label, humidity, temperature
            );
        }
        (humidity, temperature)
    }
}

impl<I: ClimateSensor, O: ClimateSensor> SensorPort for SensorHub<I, O> {
    fn read_snapshot(&mut self) -> SensorSnapshot {
        let (h_in, t_in) = Self::read_one(&mut self.inside, self.inside_cal, "inside");
        let (h_out, t_out) = Self::read_one(&mut self.outside, self.outside_cal, "outside");
        SensorSnapshot::new(h_in, t_in, h_out, t_out)
    }
}
