//! Hardware adapter — bridges the peripherals to domain port traits.
//!
//! Owns the sensor side and the relay, exposing them through
//! [`SensorPort`] and [`RelayPort`] on one value so the service can borrow
//! both mutably in a single cycle.

use crate::app::ports::{RelayPort, SensorPort};
use crate::sensors::SensorSnapshot;

/// Concrete adapter combining the sensor hub and the relay.
pub struct HardwareAdapter<S, R> {
    sensors: S,
    relay: R,
}

impl<S: SensorPort, R: RelayPort> HardwareAdapter<S, R> {
    pub fn new(sensors: S, relay: R) -> Self {
        Self { sensors, relay }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<S: SensorPort, R> SensorPort for HardwareAdapter<S, R> {
    fn read_snapshot(&mut self) -> SensorSnapshot {
        self.sensors.read_snapshot()
    }
}

// ── RelayPort implementation ──────────────────────────────────

impl<S, R: RelayPort> RelayPort for HardwareAdapter<S, R> {
    fn set_relay(&mut self, on: bool) {
        self.relay.set_relay(on);
    }

    fn is_relay_on(&self) -> bool {
        self.relay.is_relay_on()
    }
}
