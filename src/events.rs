//! Inbound event queue.
//!
//! Events are produced by:
//! - the MQTT client callback (messages, session up/down)
//! - the WiFi adapter (network up)
//!
//! and consumed by the main control loop during its idle window.  Any
//! drained event other than a disconnect ends the idle window early, so
//! the next decision cycle sees the change immediately.
//!
//! A broker (re)connect is latched in a flag rather than queued, so a
//! burst of messages filling the channel can never swallow it.  It is
//! delivered first on the next drain.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ MQTT task   │────▶│ Event channel│────▶│  Main Loop   │
//! │ WiFi events │────▶│  (bounded)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::String;
use log::warn;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 16;

pub const MAX_TOPIC_LEN: usize = 128;
pub const MAX_PAYLOAD_LEN: usize = 64;

/// One message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String<MAX_TOPIC_LEN>,
    pub payload: String<MAX_PAYLOAD_LEN>,
}

impl InboundMessage {
    /// `None` when either part exceeds its fixed capacity.
    pub fn new(topic: &str, payload: &str) -> Option<Self> {
        Some(Self {
            topic: String::try_from(topic).ok()?,
            payload: String::try_from(payload).ok()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A message arrived on a subscribed topic.
    Message(InboundMessage),
    /// The broker session was (re-)established; subscriptions are needed.
    TransportConnected,
    /// The broker session dropped.
    TransportDisconnected,
    /// The station obtained an IP address.
    NetworkUp,
}

pub type EventChannel = Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_CAP>;

/// Bounded channel plus the reconnect latch.
pub struct EventQueue {
    channel: EventChannel,
    reconnected: AtomicBool,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            reconnected: AtomicBool::new(false),
        }
    }

    /// Queue an event without blocking.  Returns `false` when the queue is
    /// full and the event was dropped; a reconnect is never dropped.
    pub fn push(&self, event: Event) -> bool {
        if event == Event::TransportConnected {
            self.reconnected.store(true, Ordering::Release);
            return true;
        }
        match self.channel.try_send(event) {
            Ok(()) => true,
            Err(_) => {
                warn!("Event queue full, dropping event");
                false
            }
        }
    }

    /// Handle every pending event, a latched reconnect first, then the
    /// channel in FIFO order.  Returns the number handled.
    pub fn drain(&self, mut handler: impl FnMut(Event)) -> usize {
        let mut n = 0;
        if self.reconnected.swap(false, Ordering::AcqRel) {
            handler(Event::TransportConnected);
            n += 1;
        }
        while let Ok(event) = self.channel.try_receive() {
            handler(event);
            n += 1;
        }
        n
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide queue shared by the callbacks and the main loop.
pub static EVENTS: EventQueue = EventQueue::new();

/// Queue an inbound MQTT message on the global channel.
pub fn push_message(topic: &str, payload: &str) -> bool {
    match InboundMessage::new(topic, payload) {
        Some(msg) => push_event(Event::Message(msg)),
        None => {
            warn!("Dropping oversized message on '{}'", topic);
            false
        }
    }
}

pub fn push_event(event: Event) -> bool {
    EVENTS.push(event)
}

pub fn drain_events(handler: impl FnMut(Event)) -> usize {
    EVENTS.drain(handler)
}
