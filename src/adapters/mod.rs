//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                 |
//! |------------|----------------|-----------------------------|
//! | `hardware` | SensorPort     | DHT22 sensor hub            |
//! |            | RelayPort      | Relay GPIO                  |
//! | `log_sink` | EventSink      | Serial log output           |
//! | `mqtt`     | MessagingPort  | ESP-IDF MQTT client         |
//! | `nvs`      | StoragePort    | NVS / in-memory store       |
//! | `time`     | —              | esp_timer, SNTP wall clock  |
//! | `wifi`     | —              | ESP-IDF WiFi STA            |

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod time;
pub mod wifi;
