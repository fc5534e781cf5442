//! Integration tests for the AppService → engine → relay/broker pipeline.
//!
//! These run on the host (x86_64) and drive whole decision cycles through
//! mock adapters, asserting on relay commands and the published topics.

use crate::mock_hw::{MockBoard, MockMqtt, RecordingSink};

use dewvent::app::config_store::ConfigStore;
use dewvent::app::engine::DecisionReason;
use dewvent::app::events::AppEvent;
use dewvent::app::ports::{QoS, TransportError};
use dewvent::app::service::AppService;
use dewvent::config::OperatingMode;
use dewvent::error::Error;
use dewvent::sensors::SensorSnapshot;

const BASE: &str = "dewpoint-ventilator/";
const MIN: u64 = 60 * 1000;

/// Dew-point delta ≈ 16 °C, comfortably above the default band.
fn humid_inside() -> SensorSnapshot {
    SensorSnapshot::new(80.0, 20.0, 50.0, 10.0)
}

/// Dew-point delta ≈ 2 °C, below the default threshold.
fn dry_inside() -> SensorSnapshot {
    SensorSnapshot::new(50.0, 15.0, 60.0, 10.0)
}

fn make_app() -> (AppService, RecordingSink) {
    let mut sink = RecordingSink::new();
    let mut app = AppService::new(ConfigStore::new(), BASE, 0);
    let mut relay = MockBoard::new(dry_inside());
    app.start(&mut relay, &mut sink);
    (app, sink)
}

fn topic(suffix: &str) -> String {
    format!("{BASE}{suffix}")
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn start_releases_relay_and_reports() {
    let mut sink = RecordingSink::new();
    let mut app = AppService::new(ConfigStore::new(), BASE, 0);
    let mut board = MockBoard::new(dry_inside());
    app.start(&mut board, &mut sink);

    assert_eq!(board.relay_calls, vec![false]);
    assert_eq!(sink.events, vec![AppEvent::Started { relay_on: false }]);
    assert!(app.relay_publish_pending(), "boot state must be announced once");
}

#[test]
fn connect_subscribes_set_and_reset_topics() {
    let (mut app, _) = make_app();
    let mut mqtt = MockMqtt::connected();
    app.on_connected(&mut mqtt).unwrap();

    assert_eq!(mqtt.subscriptions.len(), 10);
    assert!(mqtt.subscriptions.contains(&topic("config/mode/set")));
    assert!(mqtt.subscriptions.contains(&topic("config/overrideVentilationMinutes/set")));
    assert!(mqtt.subscriptions.contains(&topic("config/reset")));
}

#[test]
fn offline_broker_surfaces_as_transport_error() {
    let (mut app, _) = make_app();
    let mut mqtt = MockMqtt::default();

    let err = app.on_connected(&mut mqtt).unwrap_err();
    assert_eq!(err, Error::Transport(TransportError::NotConnected));
    assert!(!err.is_fatal());
    assert_eq!(
        app.publish_heartbeat("2026-01-01T00:00:00Z", &mut mqtt),
        Err(Error::Transport(TransportError::NotConnected))
    );
    assert!(app.publish_startup("2026-01-01T00:00:00Z", &mut mqtt).is_err());
}

// ── Decision cycles ───────────────────────────────────────────

#[test]
fn humid_inside_switches_relay_on_and_publishes() {
    let (mut app, mut sink) = make_app();
    let mut board = MockBoard::new(humid_inside());
    let mut mqtt = MockMqtt::connected();

    let result = app.run_cycle(&mut board, &mut mqtt, &mut sink, MIN).unwrap();

    assert!(result.relay_on);
    assert!(result.relay_changed);
    assert!(matches!(result.reason, DecisionReason::AboveThreshold { .. }));
    assert_eq!(board.relay_calls, vec![true]);
    assert!(app.relay_on());

    let state = mqtt.last(&topic("ventilation/state")).unwrap();
    assert_eq!(state.payload, "ON");
    assert!(state.retained);
    assert_eq!(state.qos, QoS::AtLeastOnce);
    assert_eq!(mqtt.payloads(&topic("ventilation/stateNum")), vec!["1"]);
    assert!(!app.relay_publish_pending());

    assert_eq!(mqtt.payloads(&topic("log/status")), vec!["sensors OK"]);
    assert_eq!(mqtt.payloads(&topic("sensor-inside/temperature")), vec!["20.00"]);
    assert_eq!(mqtt.payloads(&topic("sensor-outside/humidity")), vec!["50.00"]);
    let reason = mqtt.last(&topic("log/ventilatorStatusReason")).unwrap();
    assert!(reason.payload.starts_with("DeltaDP > (MIN_Delta + HYSTERESIS)"));
    assert!(!reason.retained);

    assert_eq!(sink.count(|e| matches!(e, AppEvent::Decision(_))), 1);
    assert_eq!(app.cycle_count(), 1);
}

#[test]
fn dry_inside_keeps_relay_off_without_republishing_state() {
    let (mut app, mut sink) = make_app();
    let mut board = MockBoard::new(dry_inside());
    let mut mqtt = MockMqtt::connected();

    // First cycle confirms the boot state once.
    app.run_cycle(&mut board, &mut mqtt, &mut sink, MIN).unwrap();
    assert_eq!(mqtt.payloads(&topic("ventilation/state")), vec!["OFF"]);

    mqtt.clear();
    let result = app.run_cycle(&mut board, &mut mqtt, &mut sink, 2 * MIN).unwrap();
    assert!(!result.relay_on);
    assert!(!result.relay_changed);
    assert!(mqtt.payloads(&topic("ventilation/state")).is_empty());
    assert_eq!(mqtt.payloads(&topic("sensor-inside/humidity")), vec!["50.00"]);
}

#[test]
fn relay_transition_survives_disconnection() {
    let (mut app, mut sink) = make_app();
    let mut board = MockBoard::new(humid_inside());
    let mut mqtt = MockMqtt::default();

    app.run_cycle(&mut board, &mut mqtt, &mut sink, MIN).unwrap();
    assert!(app.relay_on());
    assert!(app.relay_publish_pending());
    assert!(mqtt.sent.is_empty());

    mqtt.connected = true;
    app.flush_relay_state(&mut mqtt, &mut sink);
    assert_eq!(mqtt.payloads(&topic("ventilation/state")), vec!["ON"]);
    assert!(!app.relay_publish_pending());
}

#[test]
fn failed_publications_stay_pending() {
    let (mut app, mut sink) = make_app();
    let mut board = MockBoard::new(humid_inside());
    let mut mqtt = MockMqtt::connected();
    mqtt.fail_publish = true;

    app.run_cycle(&mut board, &mut mqtt, &mut sink, MIN).unwrap();
    assert!(app.relay_on(), "relay follows the decision regardless of the broker");
    assert!(app.relay_publish_pending());
    assert!(!app.store().pending().is_empty());
    assert!(sink.count(|e| matches!(e, AppEvent::PublishFailed(_))) >= 1);

    mqtt.fail_publish = false;
    app.run_cycle(&mut board, &mut mqtt, &mut sink, 2 * MIN).unwrap();
    assert!(!app.relay_publish_pending());
    assert!(app.store().pending().is_empty());
    assert_eq!(mqtt.payloads(&topic("config/mode")), vec!["AUTO"]);
    assert_eq!(mqtt.payloads(&topic("config/deltaDPmin")), vec!["5"]);
    assert!(mqtt.last(&topic("config/hysteresis")).unwrap().retained);
}

#[test]
fn pending_config_is_published_once() {
    let (mut app, mut sink) = make_app();
    let mut board = MockBoard::new(dry_inside());
    let mut mqtt = MockMqtt::connected();

    app.run_cycle(&mut board, &mut mqtt, &mut sink, MIN).unwrap();
    app.run_cycle(&mut board, &mut mqtt, &mut sink, 2 * MIN).unwrap();
    assert_eq!(mqtt.payloads(&topic("config/tempOutside_max")), vec!["25"]);
}

#[test]
fn sensor_fault_aborts_cycle_without_touching_relay() {
    let (mut app, mut sink) = make_app();
    let mut board = MockBoard::new(SensorSnapshot::new(f32::NAN, 20.0, 50.0, 10.0));
    let mut mqtt = MockMqtt::connected();

    let err = app.run_cycle(&mut board, &mut mqtt, &mut sink, MIN).unwrap_err();
    assert!(matches!(err, Error::Sensor(f) if f.inside && !f.outside));
    assert!(err.is_fatal());
    assert!(board.relay_calls.is_empty());
    assert_eq!(
        mqtt.payloads(&topic("log/status")),
        vec!["sensors show errors: Error reading from sensor inside. "]
    );
    assert!(mqtt.payloads(&topic("sensor-inside/temperature")).is_empty());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SensorFault(_))), 1);

    // Already reported by the cycle itself.
    mqtt.clear();
    app.publish_fault(&err, &mut mqtt);
    assert!(mqtt.sent.is_empty());
}

#[test]
fn connectivity_fault_is_announced_before_restart() {
    let (app, _) = make_app();
    let mut mqtt = MockMqtt::connected();
    app.publish_fault(&Error::ConnectivityTimeout { offline_secs: 301 }, &mut mqtt);
    assert_eq!(
        mqtt.payloads(&topic("log/status")),
        vec!["restarting: no network for 301 s"]
    );
}

// ── Override ──────────────────────────────────────────────────

#[test]
fn stale_ventilation_override_runs_then_expires() {
    let (mut app, mut sink) = make_app();
    // Humid but too cold inside: the band logic alone keeps the relay off.
    let mut board = MockBoard::new(SensorSnapshot::new(85.0, 8.0, 50.0, 10.0));
    let mut mqtt = MockMqtt::connected();

    // Boot anchored the last transition 12 h before t=0.
    let armed = app.run_cycle(&mut board, &mut mqtt, &mut sink, MIN).unwrap();
    assert!(armed.relay_on);
    assert_eq!(armed.reason, DecisionReason::OverrideActive);
    assert!(app.override_state().active);

    let running = app.run_cycle(&mut board, &mut mqtt, &mut sink, 20 * MIN).unwrap();
    assert!(running.relay_on);
    assert!(!running.relay_changed);

    let expired = app.run_cycle(&mut board, &mut mqtt, &mut sink, 32 * MIN).unwrap();
    assert!(!expired.relay_on);
    assert!(expired.relay_changed);
    assert!(!app.override_state().active);
    assert_eq!(board.relay_calls, vec![true, true, false]);
}

// ── Manual mode ───────────────────────────────────────────────

#[test]
fn manual_mode_forces_relay() {
    let (mut app, mut sink) = make_app();
    let mut storage = crate::mock_hw::MockStorage::new();
    let mut board = MockBoard::new(dry_inside());
    let mut mqtt = MockMqtt::connected();

    app.handle_message(&topic("config/mode/set"), "ON", &mut storage, &mut sink);
    assert_eq!(app.config().mode, OperatingMode::On);

    let result = app.run_cycle(&mut board, &mut mqtt, &mut sink, MIN).unwrap();
    assert!(result.relay_on);
    assert_eq!(result.reason, DecisionReason::Manual(OperatingMode::On));
    assert_eq!(
        mqtt.payloads(&topic("log/ventilatorStatusReason")),
        vec!["requested mode == ON"]
    );
}
