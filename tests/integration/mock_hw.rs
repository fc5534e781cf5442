//! Mock adapters for integration tests.
//!
//! Records every relay command, publication and storage write so tests can
//! assert on the full history without real GPIO, broker or flash.

use dewvent::app::events::AppEvent;
use dewvent::app::ports::{
    EventSink, MessagingPort, QoS, RelayPort, SensorPort, StorageError, StoragePort,
    TransportError,
};
use dewvent::sensors::SensorSnapshot;
use std::collections::{HashMap, VecDeque};

// ── MockBoard (sensors + relay) ───────────────────────────────

/// Scripted sensor readings and a recorded relay.
pub struct MockBoard {
    readings: VecDeque<SensorSnapshot>,
    last: SensorSnapshot,
    pub relay_calls: Vec<bool>,
    relay_on: bool,
}

#[allow(dead_code)]
impl MockBoard {
    /// Every read returns `snap` until [`push`](Self::push) queues others.
    pub fn new(snap: SensorSnapshot) -> Self {
        Self {
            readings: VecDeque::new(),
            last: snap,
            relay_calls: Vec::new(),
            relay_on: false,
        }
    }

    pub fn push(&mut self, snap: SensorSnapshot) {
        self.readings.push_back(snap);
    }
}

impl SensorPort for MockBoard {
    fn read_snapshot(&mut self) -> SensorSnapshot {
        if let Some(next) = self.readings.pop_front() {
            self.last = next;
        }
        self.last
    }
}

impl RelayPort for MockBoard {
    fn set_relay(&mut self, on: bool) {
        self.relay_calls.push(on);
        self.relay_on = on;
    }

    fn is_relay_on(&self) -> bool {
        self.relay_on
    }
}

// ── MockMqtt ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub topic: String,
    pub payload: String,
    pub retained: bool,
    pub qos: QoS,
}

#[derive(Default)]
pub struct MockMqtt {
    pub connected: bool,
    /// Every publish fails with `PublishFailed` while set.
    pub fail_publish: bool,
    pub sent: Vec<Sent>,
    pub subscriptions: Vec<String>,
}

#[allow(dead_code)]
impl MockMqtt {
    pub fn connected() -> Self {
        Self { connected: true, ..Self::default() }
    }

    /// Payloads published on `topic`, oldest first.
    pub fn payloads(&self, topic: &str) -> Vec<&str> {
        self.sent
            .iter()
            .filter(|s| s.topic == topic)
            .map(|s| s.payload.as_str())
            .collect()
    }

    pub fn last(&self, topic: &str) -> Option<&Sent> {
        self.sent.iter().rev().find(|s| s.topic == topic)
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl MessagingPort for MockMqtt {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &str,
        retained: bool,
        qos: QoS,
    ) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        if self.fail_publish {
            return Err(TransportError::PublishFailed);
        }
        self.sent.push(Sent {
            topic: topic.to_string(),
            payload: payload.to_string(),
            retained,
            qos,
        });
        Ok(())
    }

    fn subscribe(&mut self, topic: &str, _qos: QoS) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.subscriptions.push(topic.to_string());
        Ok(())
    }
}

// ── MockStorage ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockStorage {
    map: HashMap<String, Vec<u8>>,
    pub fail_writes: bool,
    pub writes: usize,
}

#[allow(dead_code)]
impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, namespace: &str, key: &str) -> Option<&[u8]> {
        self.map.get(&format!("{namespace}::{key}")).map(Vec::as_slice)
    }

    pub fn put(&mut self, namespace: &str, key: &str, data: &[u8]) {
        self.map.insert(format!("{namespace}::{key}"), data.to_vec());
    }
}

impl StoragePort for MockStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let v = self.map.get(&format!("{namespace}::{key}")).ok_or(StorageError::NotFound)?;
        if v.len() > buf.len() {
            return Err(StorageError::BufferTooSmall);
        }
        buf[..v.len()].copy_from_slice(v);
        Ok(v.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.writes += 1;
        self.map.insert(format!("{namespace}::{key}"), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.map.remove(&format!("{namespace}::{key}"));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.map.contains_key(&format!("{namespace}::{key}"))
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
