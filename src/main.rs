//! Dewvent Firmware — Main Entry Point
//!
//! Hexagonal architecture around a one-minute decision cycle.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   Esp32Time       │
//! │  (Sensor+Relay)    (EventSink)    (Storage)    (uptime, SNTP)  │
//! │  WifiAdapter       MqttAdapter                                 │
//! │  (station link)    (Messaging)                                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  ConfigStore · VentilationEngine · RemoteControl       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ConnectivitySupervisor · Watchdog · StatusLed                 │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use embedded_hal::digital::OutputPin;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::{Ets, FreeRtos};
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use dewvent::adapters::hardware::HardwareAdapter;
use dewvent::adapters::log_sink::LogEventSink;
use dewvent::adapters::mqtt::{MqttAdapter, MqttSettings};
use dewvent::adapters::nvs::NvsAdapter;
use dewvent::adapters::time::Esp32TimeAdapter;
use dewvent::adapters::wifi::WifiAdapter;
use dewvent::app::config_store::ConfigStore;
use dewvent::app::ports::{EventSink, MessagingPort, StoragePort};
use dewvent::app::service::AppService;
use dewvent::config::DeviceConfig;
use dewvent::drivers::relay::RelayDriver;
use dewvent::drivers::status_led::StatusLed;
use dewvent::drivers::watchdog::Watchdog;
use dewvent::error::Error;
use dewvent::events::{self, Event};
use dewvent::pins;
use dewvent::sensors::SensorHub;
use dewvent::sensors::dht22::Dht22;
use dewvent::supervisor::ConnectivitySupervisor;

/// Blink time between a fault report and the restart delay.
const FAULT_BLINK_MS: u32 = 500;

// ── Event servicing ───────────────────────────────────────────

/// Drain the cross-task queue.  Returns `true` if anything other than a
/// disconnect arrived, which ends the idle window early.
fn service_events(
    app: &mut AppService,
    mqtt: &mut impl MessagingPort,
    storage: &mut impl StoragePort,
    sink: &mut impl EventSink,
) -> bool {
    let mut wake = false;
    events::drain_events(|event| match event {
        Event::TransportConnected => {
            info!("MQTT: connected");
            if let Err(e) = app.on_connected(mqtt) {
                warn!("MQTT: subscribe failed: {}", e);
            }
            app.flush_relay_state(mqtt, sink);
            wake = true;
        }
        Event::TransportDisconnected => warn!("MQTT: disconnected"),
        Event::NetworkUp => {
            info!("WiFi: address assigned");
            wake = true;
        }
        Event::Message(msg) => {
            app.handle_message(&msg.topic, &msg.payload, storage, sink);
            wake = true;
        }
    });
    wake
}

/// Report, blink, wait, restart.  Never returns.
fn fatal_restart(
    err: &Error,
    app: &AppService,
    mqtt: &mut impl MessagingPort,
    led: &mut StatusLed<impl OutputPin>,
    delay_ms: u32,
) -> ! {
    error!("Fatal: {}, restarting in {} ms", err, delay_ms);
    app.publish_fault(err, mqtt);
    led.blink_for(FAULT_BLINK_MS, &mut FreeRtos);
    FreeRtos::delay_ms(delay_ms);
    esp_idf_svc::hal::reset::restart()
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Dewvent v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let device = DeviceConfig::from_env();
    let watchdog = Watchdog::new(device.watchdog_timeout_ms);
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let mut time = Esp32TimeAdapter::new();

    // ── 2. Tunables from NVS (defaults on first boot) ─────────
    let mut nvs = NvsAdapter::new()?;
    let mut store = ConfigStore::new();
    if let Err(e) = store.load_or_reset(&mut nvs) {
        warn!("Config: {}, running with defaults", e);
    }
    info!("Config: {:?}", store.config());

    // ── 3. Hardware ───────────────────────────────────────────
    // Pin objects must match the numbers in `pins`.
    let gpio = peripherals.pins;
    let inside_pin = PinDriver::input_output_od(gpio.gpio13)?;
    let outside_pin = PinDriver::input_output_od(gpio.gpio14)?;
    let relay_pin = PinDriver::output(gpio.gpio12)?;
    let led_pin = PinDriver::output(gpio.gpio2)?;
    info!(
        "Pins: relay=GPIO{} dht_in=GPIO{} dht_out=GPIO{} led=GPIO{}",
        pins::RELAY_GPIO,
        pins::DHT_INSIDE_GPIO,
        pins::DHT_OUTSIDE_GPIO,
        pins::STATUS_LED_GPIO
    );

    let sensor_hub = SensorHub::new(Dht22::new(inside_pin, Ets), Dht22::new(outside_pin, Ets))
        .with_calibration(device.inside_calibration, device.outside_calibration);
    let mut hw = HardwareAdapter::new(sensor_hub, RelayDriver::new(relay_pin));
    let mut led = StatusLed::new(led_pin);
    let mut log_sink = LogEventSink::new();

    // ── 4. App service ────────────────────────────────────────
    let mut app = AppService::new(store, &device.base_topic, time.uptime_ms());
    app.start(&mut hw, &mut log_sink);

    // ── 5. Network ────────────────────────────────────────────
    let mut wifi = WifiAdapter::new(
        peripherals.modem,
        sysloop,
        EspDefaultNvsPartition::take().ok(),
    )?;
    match device.wifi_ssid {
        Some(ssid) => {
            wifi.set_credentials(ssid, device.wifi_password)
                .map_err(|e| anyhow::anyhow!("WiFi credentials: {e}"))?;
            if let Err(e) = wifi.start(time.uptime_ms()) {
                warn!("WiFi: {}", e);
            }
        }
        None => warn!("WiFi: no SSID configured at build time"),
    }

    let settings = MqttSettings::from_device(&device)
        .ok_or_else(|| anyhow::anyhow!("no MQTT broker URL configured at build time"))?;
    let mut mqtt = MqttAdapter::connect(&settings)?;

    if let Err(e) = time.start_sntp() {
        warn!("SNTP: {}", e);
    }

    let mut supervisor = ConnectivitySupervisor::new(device.max_offline_ms, time.uptime_ms());
    let mut startup_published = false;

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        watchdog.feed();

        if let Err(e) = supervisor.check(wifi.is_connected(), time.uptime_ms()) {
            fatal_restart(&e, &app, &mut mqtt, &mut led, device.fatal_restart_delay_ms);
        }

        service_events(&mut app, &mut mqtt, &mut nvs, &mut log_sink);

        if !startup_published && mqtt.is_connected() && time.is_synced() {
            match app.publish_startup(&time.timestamp(), &mut mqtt) {
                Ok(()) => startup_published = true,
                Err(e) => warn!("Startup message not published: {}", e),
            }
        }

        led.busy();
        let outcome = app.run_cycle(&mut hw, &mut mqtt, &mut log_sink, time.uptime_ms());
        led.idle();
        if let Err(e) = outcome {
            if e.is_fatal() {
                fatal_restart(&e, &app, &mut mqtt, &mut led, device.fatal_restart_delay_ms);
            }
            warn!("Cycle {}: {}", app.cycle_count(), e);
        }

        // ── Idle window ───────────────────────────────────────
        for step in 0..device.idle_steps {
            if step % device.heartbeat_every_steps == 0 && mqtt.is_connected() {
                if let Err(e) = app.publish_heartbeat(&time.timestamp(), &mut mqtt) {
                    warn!("Heartbeat not published: {}", e);
                }
            }

            FreeRtos::delay_ms(1_000);
            watchdog.feed();
            wifi.poll(time.uptime_ms());

            if service_events(&mut app, &mut mqtt, &mut nvs, &mut log_sink) {
                info!("Woken by event, starting next cycle early");
                break;
            }
        }
    }
}
