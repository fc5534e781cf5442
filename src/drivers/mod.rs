//! Actuator and peripheral drivers.

pub mod relay;
pub mod status_led;
pub mod watchdog;
