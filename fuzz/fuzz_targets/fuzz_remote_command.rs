//! Fuzz target: inbound broker messages
//!
//! Splits the input into a topic and a payload and runs them through the
//! command parser and the field value parser:
//! - No panics for any UTF-8 topic or payload
//! - A recognised `Set` always names a field under the base topic
//! - Accepted values are always within the field's range
//!
//! cargo fuzz run fuzz_remote_command

#![no_main]

use dewvent::app::commands::RemoteCommand;
use dewvent::app::remote::parse_command;
use libfuzzer_sys::fuzz_target;

const BASE: &str = "dewpoint-ventilator/";

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let (suffix, payload) = text.split_once('\n').unwrap_or((text, ""));
    let topic = format!("{BASE}{suffix}");

    match parse_command(BASE, &topic, payload) {
        Some(RemoteCommand::Set { field, raw }) => {
            assert!(topic.contains(field.remote_name()));
            if let Ok(value) = field.parse(&raw) {
                assert!(field.validate(value).is_ok());
            }
        }
        Some(RemoteCommand::Reset) => assert!(payload == "true" || payload == "1"),
        None => {}
    }
});
