//! Remote configuration over the broker: set topics, reset, and the
//! publish-back of changed values.

use crate::mock_hw::{MockBoard, MockMqtt, MockStorage, RecordingSink};

use dewvent::app::commands::RemoteCommand;
use dewvent::app::config_store::{CONFIG_KEY, CONFIG_NAMESPACE, ConfigStore};
use dewvent::app::events::AppEvent;
use dewvent::app::service::AppService;
use dewvent::config::{ConfigField, FieldValue, VentConfig};
use dewvent::sensors::SensorSnapshot;

const BASE: &str = "home/cellar/";
const MIN: u64 = 60 * 1000;

fn make_app() -> (AppService, MockStorage, RecordingSink) {
    (AppService::new(ConfigStore::new(), BASE, 0), MockStorage::new(), RecordingSink::new())
}

/// Run one quiet cycle so the boot-time pending flags are flushed.
fn settle(app: &mut AppService, mqtt: &mut MockMqtt, sink: &mut RecordingSink) {
    let mut board = MockBoard::new(SensorSnapshot::new(50.0, 15.0, 60.0, 10.0));
    app.run_cycle(&mut board, mqtt, sink, MIN).unwrap();
    mqtt.clear();
}

#[test]
fn valid_value_is_applied_persisted_and_echoed() {
    let (mut app, mut storage, mut sink) = make_app();
    let mut mqtt = MockMqtt::connected();
    settle(&mut app, &mut mqtt, &mut sink);

    let cmd = app.handle_message("home/cellar/config/hysteresis/set", "3", &mut storage, &mut sink);
    assert_eq!(
        cmd,
        Some(RemoteCommand::Set { field: ConfigField::Hysteresis, raw: "3".into() })
    );
    assert_eq!(app.config().hysteresis, 3);
    assert!(sink.events.contains(&AppEvent::ConfigChanged {
        field: ConfigField::Hysteresis,
        value: FieldValue::Int(3),
    }));

    let doc = storage.raw(CONFIG_NAMESPACE, CONFIG_KEY).unwrap();
    let json: serde_json::Value = serde_json::from_slice(doc).unwrap();
    assert_eq!(json["hysteresis"], 3);

    // Only the changed field is echoed on the next cycle.
    assert!(app.store().pending().contains(ConfigField::Hysteresis));
    let mut board = MockBoard::new(SensorSnapshot::new(50.0, 15.0, 60.0, 10.0));
    app.run_cycle(&mut board, &mut mqtt, &mut sink, 2 * MIN).unwrap();
    assert_eq!(mqtt.payloads("home/cellar/config/hysteresis"), vec!["3"]);
    assert!(mqtt.payloads("home/cellar/config/mode").is_empty());
}

#[test]
fn decimal_values_are_truncated() {
    let (mut app, mut storage, mut sink) = make_app();
    app.handle_message("home/cellar/config/deltaDPmin/set", "7.9", &mut storage, &mut sink);
    assert_eq!(app.config().min_dewpoint_delta, 7);
}

#[test]
fn invalid_value_is_rejected_and_nothing_changes() {
    let (mut app, mut storage, mut sink) = make_app();
    let mut mqtt = MockMqtt::connected();
    settle(&mut app, &mut mqtt, &mut sink);

    app.handle_message("home/cellar/config/hysteresis/set", "lots", &mut storage, &mut sink);
    app.handle_message("home/cellar/config/tempOutside_max/set", "500", &mut storage, &mut sink);

    assert_eq!(*app.config(), VentConfig::default());
    assert!(app.store().pending().is_empty());
    assert_eq!(storage.writes, 0);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ConfigRejected { .. })), 2);
}

#[test]
fn unknown_mode_falls_back_to_auto() {
    let (mut app, mut storage, mut sink) = make_app();
    app.handle_message("home/cellar/config/mode/set", "OFF", &mut storage, &mut sink);
    assert_eq!(app.config().mode.as_str(), "OFF");
    app.handle_message("home/cellar/config/mode/set", "sideways", &mut storage, &mut sink);
    assert_eq!(app.config().mode.as_str(), "AUTO");
}

#[test]
fn storage_failure_keeps_value_in_memory() {
    let (mut app, mut storage, mut sink) = make_app();
    storage.fail_writes = true;

    app.handle_message(
        "home/cellar/config/overrideVentilationMinutes/set",
        "45",
        &mut storage,
        &mut sink,
    );
    assert_eq!(app.config().override_minutes, 45);
    assert!(app.store().pending().contains(ConfigField::OverrideMinutes));
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::ConfigRejected { field: ConfigField::OverrideMinutes, .. }
    )));
}

#[test]
fn foreign_and_unknown_topics_are_ignored() {
    let (mut app, mut storage, mut sink) = make_app();
    for topic in [
        "other/config/hysteresis/set",
        "home/cellar/config/bogus/set",
        "home/cellar/config/hysteresis",
        "home/cellar/ventilation/state",
    ] {
        assert_eq!(app.handle_message(topic, "2", &mut storage, &mut sink), None, "{topic}");
    }
    assert!(sink.events.is_empty());
    assert_eq!(storage.writes, 0);
}

#[test]
fn reset_requires_explicit_payload() {
    let (mut app, mut storage, mut sink) = make_app();
    app.handle_message("home/cellar/config/hysteresis/set", "4", &mut storage, &mut sink);

    assert_eq!(app.handle_message("home/cellar/config/reset", "false", &mut storage, &mut sink), None);
    assert_eq!(app.config().hysteresis, 4);

    let cmd = app.handle_message("home/cellar/config/reset", "true", &mut storage, &mut sink);
    assert_eq!(cmd, Some(RemoteCommand::Reset));
    assert_eq!(*app.config(), VentConfig::default());
    assert!(sink.events.contains(&AppEvent::ConfigReset));
    for field in ConfigField::ALL {
        assert!(app.store().pending().contains(field), "{field:?} not pending after reset");
    }
}

#[test]
fn reset_accepts_numeric_one() {
    let (mut app, mut storage, mut sink) = make_app();
    app.handle_message("home/cellar/config/mode/set", "ON", &mut storage, &mut sink);
    app.handle_message("home/cellar/config/reset", "1", &mut storage, &mut sink);
    assert_eq!(app.config().mode.as_str(), "AUTO");
}
