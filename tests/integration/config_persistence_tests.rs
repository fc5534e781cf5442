//! Tunables across reboots: first boot, stored documents, corruption.

use crate::mock_hw::{MockStorage, RecordingSink};

use dewvent::app::config_store::{CONFIG_KEY, CONFIG_NAMESPACE, ConfigStore};
use dewvent::app::ports::ConfigError;
use dewvent::app::service::AppService;
use dewvent::config::{OperatingMode, VentConfig};

#[test]
fn first_boot_writes_defaults() {
    let mut storage = MockStorage::new();
    let mut store = ConfigStore::new();
    store.load_or_reset(&mut storage).unwrap();

    assert_eq!(*store.config(), VentConfig::default());
    assert!(storage.raw(CONFIG_NAMESPACE, CONFIG_KEY).is_some());
    assert_eq!(storage.writes, 1);
}

#[test]
fn remote_change_survives_reboot() {
    let mut storage = MockStorage::new();
    let mut sink = RecordingSink::new();

    let mut first = ConfigStore::new();
    first.load_or_reset(&mut storage).unwrap();
    let mut app = AppService::new(first, "dewpoint-ventilator/", 0);
    app.handle_message("dewpoint-ventilator/config/tempInside_min/set", "12", &mut storage, &mut sink);
    app.handle_message("dewpoint-ventilator/config/mode/set", "OFF", &mut storage, &mut sink);

    let mut second = ConfigStore::new();
    second.load(&storage).unwrap();
    assert_eq!(second.config().min_inside_temp, 12);
    assert_eq!(second.config().mode, OperatingMode::Off);
    // A reboot republishes everything.
    assert!(!second.pending().is_empty());
}

#[test]
fn partial_document_keeps_other_defaults() {
    let mut storage = MockStorage::new();
    storage.put(CONFIG_NAMESPACE, CONFIG_KEY, br#"{"tempOutside_max": 30, "hysteresis": "x"}"#);

    let mut store = ConfigStore::new();
    store.load(&storage).unwrap();
    assert_eq!(store.config().max_outside_temp, 30);
    assert_eq!(store.config().hysteresis, VentConfig::default().hysteresis);
    assert_eq!(store.config().mode, OperatingMode::Auto);
}

#[test]
fn corrupted_document_is_replaced() {
    let mut storage = MockStorage::new();
    storage.put(CONFIG_NAMESPACE, CONFIG_KEY, b"{not json");

    let mut store = ConfigStore::new();
    assert_eq!(store.load(&storage), Err(ConfigError::Corrupted));

    store.load_or_reset(&mut storage).unwrap();
    assert_eq!(*store.config(), VentConfig::default());
    let doc = storage.raw(CONFIG_NAMESPACE, CONFIG_KEY).unwrap();
    assert!(serde_json::from_slice::<serde_json::Value>(doc).is_ok());
}

#[test]
fn unwritable_storage_still_yields_defaults() {
    let mut storage = MockStorage::new();
    storage.fail_writes = true;

    let mut store = ConfigStore::new();
    assert!(store.load_or_reset(&mut storage).is_err());
    assert_eq!(*store.config(), VentConfig::default());
}
