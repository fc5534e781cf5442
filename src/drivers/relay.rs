//! Ventilator relay driver.
//!
//! One digital output, active HIGH.  The driver remembers the last command
//! so [`RelayPort::is_relay_on`] never has to read the pin back.  A pin
//! error is logged and the remembered state is left unchanged, so the next
//! cycle retries the transition.

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::app::ports::RelayPort;

pub struct RelayDriver<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Take the pin and release the relay.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            warn!("Relay: initial release failed");
        }
        Self { pin, on: false }
    }
}

impl<P: OutputPin> RelayPort for RelayDriver<P> {
    fn set_relay(&mut self, on: bool) {
        let res = if on { self.pin.set_high() } else { self.pin.set_low() };
        match res {
            Ok(()) => {
                if on != self.on {
                    info!("Relay {}", if on { "ON" } else { "OFF" });
                }
                self.on = on;
            }
            Err(_) => warn!("Relay: pin write failed"),
        }
    }

    fn is_relay_on(&self) -> bool {
        self.on
    }
}
