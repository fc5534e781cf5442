//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART in production, stderr on the host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { relay_on } => {
                info!("START | relay={}", if *relay_on { "ON" } else { "OFF" });
            }
            AppEvent::Decision(d) => {
                info!(
                    "CYCLE | relay={}{} | dDP={:.2}\u{00b0}C | {}",
                    if d.relay_on { "ON" } else { "OFF" },
                    if d.relay_changed { " (changed)" } else { "" },
                    d.delta_dewpoint,
                    d.reason,
                );
            }
            AppEvent::SensorFault(fault) => {
                warn!("FAULT | {}", fault);
            }
            AppEvent::ConfigChanged { field, value } => {
                info!("CONFIG | {} = {}", field.remote_name(), value);
            }
            AppEvent::ConfigRejected { field, error } => {
                warn!("CONFIG | {} rejected: {}", field.remote_name(), error);
            }
            AppEvent::ConfigReset => {
                info!("CONFIG | reset to defaults");
            }
            AppEvent::PublishFailed(e) => {
                warn!("MQTT | publish failed: {}", e);
            }
        }
    }
}
