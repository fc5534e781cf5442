//! GPIO pin assignments for the ventilation controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Actuator
// ---------------------------------------------------------------------------

/// Digital output driving the ventilator relay (active HIGH).
pub const RELAY_GPIO: i32 = 12;

// ---------------------------------------------------------------------------
// Sensors (DHT22, open-drain single-wire bus, external 10 kΩ pull-up)
// ---------------------------------------------------------------------------

pub const DHT_INSIDE_GPIO: i32 = 13;
pub const DHT_OUTSIDE_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// On-board blue LED, lit while a decision cycle is running.
pub const STATUS_LED_GPIO: i32 = 2;
