//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the configuration store, the decision engine and
//! the remote topic surface.  All I/O flows through port traits injected
//! at call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌─────────────────────────┐ ──▶ EventSink
//!                 │       AppService         │
//!   RelayPort ◀── │ ConfigStore · Engine     │ ◀─▶ MessagingPort
//!                 └─────────────────────────┘ ◀─▶ StoragePort
//! ```

use log::{info, warn};

use crate::config::VentConfig;
use crate::error::{self, Error};

use super::commands::RemoteCommand;
use super::config_store::ConfigStore;
use super::engine::{DecisionResult, OverrideState, VentilationEngine};
use super::events::{AppEvent, DecisionSummary};
use super::ports::{EventSink, MessagingPort, QoS, RelayPort, SensorPort, StoragePort};
use super::remote::RemoteControlSurface;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    store: ConfigStore,
    engine: VentilationEngine,
    remote: RemoteControlSurface,
    /// Relay command of the previous cycle.
    relay_on: bool,
    /// A relay state not yet confirmed by the broker.
    relay_publish_pending: bool,
    cycle_count: u64,
}

impl AppService {
    /// Build the service around an already loaded store.
    ///
    /// `now_ms` is the boot uptime; it anchors the stale-ventilation timer.
    pub fn new(store: ConfigStore, base_topic: &str, now_ms: u64) -> Self {
        let engine = VentilationEngine::new(store.config(), now_ms);
        Self {
            store,
            engine,
            remote: RemoteControlSurface::new(base_topic),
            relay_on: false,
            relay_publish_pending: true,
            cycle_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive the relay to its initial (off) state.
    pub fn start(&mut self, relay: &mut impl RelayPort, sink: &mut impl EventSink) {
        relay.set_relay(self.relay_on);
        sink.emit(&AppEvent::Started { relay_on: self.relay_on });
        info!("AppService started, relay {}", if self.relay_on { "ON" } else { "OFF" });
    }

    /// Call after every (re)connect of the broker session.
    pub fn on_connected(&mut self, mqtt: &mut impl MessagingPort) -> error::Result<()> {
        self.remote.subscribe_all(mqtt)?;
        info!("Subscribed below '{}'", self.remote.base_topic());
        Ok(())
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// One decision cycle: pending config → sensors → engine → relay →
    /// publications.
    ///
    /// A sensor fault is returned as [`Error::Sensor`] after its status
    /// has been published; the relay is left untouched.  Transport failures
    /// are reported through the sink and retried next cycle.
    pub fn run_cycle(
        &mut self,
        hw: &mut (impl SensorPort + RelayPort),
        mqtt: &mut impl MessagingPort,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> error::Result<DecisionResult> {
        self.cycle_count += 1;
        let connected = mqtt.is_connected();

        // 1. Outstanding config publications
        if connected && !self.store.pending().is_empty() {
            let n = self.remote.publish_pending_config(&mut self.store, mqtt);
            info!("Published {} config value(s)", n);
        }

        // 2. Sensors
        let snap = hw.read_snapshot();
        if connected {
            if let Err(e) = self.remote.publish_sensor_status(&snap, mqtt) {
                sink.emit(&AppEvent::PublishFailed(e));
            }
        }

        // 3. Decision
        let result = match self.engine.evaluate(&snap, self.store.config(), self.relay_on, now_ms) {
            Ok(r) => r,
            Err(fault) => {
                warn!("Sensor fault: {}", fault);
                sink.emit(&AppEvent::SensorFault(fault));
                return Err(fault.into());
            }
        };

        // 4. Relay
        hw.set_relay(result.relay_on);
        if result.relay_changed {
            self.relay_publish_pending = true;
        }
        self.relay_on = result.relay_on;

        // 5. Publications
        if connected {
            if let Err(e) = self.remote.publish_decision(&snap, &result, mqtt) {
                sink.emit(&AppEvent::PublishFailed(e));
            }
        }
        self.flush_relay_state(mqtt, sink);

        sink.emit(&AppEvent::Decision(DecisionSummary {
            relay_on: result.relay_on,
            relay_changed: result.relay_changed,
            delta_dewpoint: result.delta_dewpoint,
            reason: result.reason,
        }));
        Ok(result)
    }

    /// Publish the relay state if a transition is still unconfirmed.
    pub fn flush_relay_state(&mut self, mqtt: &mut impl MessagingPort, sink: &mut impl EventSink) {
        if !self.relay_publish_pending || !mqtt.is_connected() {
            return;
        }
        match self.remote.publish_relay_state(self.relay_on, mqtt) {
            Ok(()) => self.relay_publish_pending = false,
            Err(e) => sink.emit(&AppEvent::PublishFailed(e)),
        }
    }

    // ── Remote commands ───────────────────────────────────────

    /// Apply an inbound message.  Returns the recognised command, if any.
    pub fn handle_message(
        &mut self,
        topic: &str,
        payload: &str,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> Option<RemoteCommand> {
        let cmd = self.remote.parse_command(topic, payload)?;
        match &cmd {
            RemoteCommand::Set { field, raw } => {
                match self.store.set_field(*field, raw, storage) {
                    Ok(value) => sink.emit(&AppEvent::ConfigChanged { field: *field, value }),
                    Err(error) => {
                        warn!("Config '{}' = '{}' not applied: {}", field.remote_name(), raw, error);
                        sink.emit(&AppEvent::ConfigRejected { field: *field, error });
                    }
                }
            }
            RemoteCommand::Reset => {
                if let Err(e) = self.store.reset(storage) {
                    warn!("Saving defaults after reset failed: {}", Error::from(e));
                }
                sink.emit(&AppEvent::ConfigReset);
            }
        }
        Some(cmd)
    }

    // ── Housekeeping publications ─────────────────────────────

    pub fn publish_heartbeat(
        &self,
        timestamp: &str,
        mqtt: &mut impl MessagingPort,
    ) -> error::Result<()> {
        Ok(self.remote.publish_heartbeat(timestamp, mqtt)?)
    }

    pub fn publish_startup(
        &self,
        timestamp: &str,
        mqtt: &mut impl MessagingPort,
    ) -> error::Result<()> {
        Ok(self.remote.publish_startup(timestamp, mqtt)?)
    }

    /// Best-effort status publication before a fatal restart.
    ///
    /// Sensor faults are already reported by [`run_cycle`](Self::run_cycle).
    pub fn publish_fault(&self, fault: &Error, mqtt: &mut impl MessagingPort) {
        if matches!(fault, Error::Sensor(_)) || !mqtt.is_connected() {
            return;
        }
        if let Err(e) = mqtt
            .publish(
                &self.remote.topic("log/status"),
                &format!("restarting: {fault}"),
                false,
                QoS::AtLeastOnce,
            )
            .map_err(Error::from)
        {
            warn!("Fault status not published: {}", e);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &VentConfig {
        self.store.config()
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn relay_on(&self) -> bool {
        self.relay_on
    }

    pub fn relay_publish_pending(&self) -> bool {
        self.relay_publish_pending
    }

    pub fn override_state(&self) -> OverrideState {
        self.engine.override_state()
    }

    /// Decision cycles run since boot.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }
}
