//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules of the ventilation controller:
//! the decision engine, configuration persistence and the MQTT topic
//! surface.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod commands;
pub mod config_store;
pub mod engine;
pub mod events;
pub mod ports;
pub mod remote;
pub mod service;
