//! Fuzz target: stored configuration document
//!
//! Feeds arbitrary bytes to the NVS document parser and verifies:
//! - No panics on malformed JSON, wrong types or huge numbers
//! - Every accepted configuration is within each field's range
//! - An accepted configuration survives a save/load cycle unchanged
//!
//! cargo fuzz run fuzz_config_document

#![no_main]

use dewvent::app::config_store::parse_document;
use dewvent::config::ConfigField;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = parse_document(data) else {
        return;
    };

    for field in ConfigField::ALL {
        assert!(
            field.validate(config.get(field)).is_ok(),
            "{} out of range after parse",
            field.storage_key()
        );
    }

    let saved = serde_json::to_vec(&config).expect("config serialises");
    let reloaded = parse_document(&saved).expect("saved document parses");
    assert_eq!(config, reloaded);
});
