//! MQTT broker adapter.
//!
//! Implements [`MessagingPort`].
//!
//! - **`target_os = "espidf"`**: `EspMqttClient` with a callback.  The
//!   callback runs on the ESP-IDF MQTT task and only forwards events into
//!   the global [`events`](crate::events) queue; connection state is kept
//!   in an atomic.
//! - **all other targets**: a recording stub that stores every publication
//!   and subscription for inspection.
//!
//! Session options: persistent session (no clean start), 20 s keep-alive,
//! 2 s network timeout.

use core::time::Duration;

#[cfg(target_os = "espidf")]
use std::sync::Arc;
#[cfg(target_os = "espidf")]
use std::sync::atomic::{AtomicBool, Ordering};

use log::info;

use crate::app::ports::{MessagingPort, QoS, TransportError};
use crate::config::DeviceConfig;

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    Details, EspMqttClient, EventPayload, MqttClientConfiguration, QoS as EspQoS,
};

#[cfg(target_os = "espidf")]
use crate::events::{self, Event};

/// Connection parameters derived from the device configuration.
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub url: String,
    pub client_id: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub keep_alive: Duration,
    pub network_timeout: Duration,
}

impl MqttSettings {
    /// `None` when no broker URL was configured at build time.
    pub fn from_device(cfg: &DeviceConfig) -> Option<Self> {
        Some(Self {
            url: cfg.mqtt_url?.to_string(),
            client_id: cfg.mqtt_client_id.to_string(),
            user: cfg.mqtt_user.map(str::to_string),
            password: cfg.mqtt_password.map(str::to_string),
            keep_alive: Duration::from_secs(cfg.mqtt_keep_alive_secs),
            network_timeout: Duration::from_millis(cfg.mqtt_timeout_ms),
        })
    }
}

/// One publication seen by the host stub.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub topic: String,
    pub payload: String,
    pub retained: bool,
    pub qos: QoS,
}

pub struct MqttAdapter {
    #[cfg(target_os = "espidf")]
    client: EspMqttClient<'static>,
    #[cfg(target_os = "espidf")]
    connected: Arc<AtomicBool>,

    #[cfg(not(target_os = "espidf"))]
    pub connected: bool,
    #[cfg(not(target_os = "espidf"))]
    pub published: Vec<Publication>,
    #[cfg(not(target_os = "espidf"))]
    pub subscriptions: Vec<String>,
}

impl MqttAdapter {
    /// Create the client; the ESP-IDF client connects in the background
    /// and reconnects on its own.
    #[cfg(target_os = "espidf")]
    pub fn connect(settings: &MqttSettings) -> anyhow::Result<Self> {
        let conf = MqttClientConfiguration {
            client_id: Some(&settings.client_id),
            username: settings.user.as_deref(),
            password: settings.password.as_deref(),
            keep_alive_interval: Some(settings.keep_alive),
            network_timeout: settings.network_timeout,
            disable_clean_session: true,
            ..Default::default()
        };

        let connected = Arc::new(AtomicBool::new(false));
        let flag = connected.clone();
        let client = EspMqttClient::new_cb(&settings.url, &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => {
                    flag.store(true, Ordering::Release);
                    events::push_event(Event::TransportConnected);
                }
                EventPayload::Disconnected => {
                    flag.store(false, Ordering::Release);
                    events::push_event(Event::TransportDisconnected);
                }
                EventPayload::Received { topic: Some(topic), data, details: Details::Complete, .. } => {
                    match core::str::from_utf8(data) {
                        Ok(payload) => {
                            events::push_message(topic, payload);
                        }
                        Err(_) => log::warn!("MQTT: non-UTF-8 payload on '{}'", topic),
                    }
                }
                EventPayload::Error(e) => log::warn!("MQTT: {:?}", e),
                _ => {}
            }
        })?;
        info!("MQTT: client for {} created", settings.url);

        Ok(Self { client, connected })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn connect(settings: &MqttSettings) -> anyhow::Result<Self> {
        info!("MQTT(sim): pretending to connect to {}", settings.url);
        Ok(Self::simulated())
    }

    /// Disconnected host stub with empty logs.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulated() -> Self {
        Self {
            connected: false,
            published: Vec::new(),
            subscriptions: Vec::new(),
        }
    }
}

#[cfg(target_os = "espidf")]
fn esp_qos(qos: QoS) -> EspQoS {
    match qos {
        QoS::AtMostOnce => EspQoS::AtMostOnce,
        QoS::AtLeastOnce => EspQoS::AtLeastOnce,
    }
}

impl MessagingPort for MqttAdapter {
    fn is_connected(&self) -> bool {
        #[cfg(target_os = "espidf")]
        {
            self.connected.load(Ordering::Acquire)
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.connected
        }
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &str,
        retained: bool,
        qos: QoS,
    ) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        #[cfg(target_os = "espidf")]
        {
            self.client
                .enqueue(topic, esp_qos(qos), retained, payload.as_bytes())
                .map(|_| ())
                .map_err(|_| TransportError::PublishFailed)
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.published.push(Publication {
                topic: topic.to_string(),
                payload: payload.to_string(),
                retained,
                qos,
            });
            Ok(())
        }
    }

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        #[cfg(target_os = "espidf")]
        {
            self.client
                .subscribe(topic, esp_qos(qos))
                .map(|_| ())
                .map_err(|_| TransportError::SubscribeFailed)
        }

        #[cfg(not(target_os = "espidf"))]
        {
            let _ = qos;
            self.subscriptions.push(topic.to_string());
            Ok(())
        }
    }
}
