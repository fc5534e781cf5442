//! Single-colour status LED.
//!
//! The on-board LED is wired active LOW.  It is lit while a decision cycle
//! runs and blinks while the firmware waits for the network.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// Half period of the waiting blink.
const BLINK_HALF_PERIOD_MS: u32 = 50;

pub struct StatusLed<P> {
    pin: P,
    lit: bool,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P) -> Self {
        let mut led = Self { pin, lit: true };
        led.set(false);
        led
    }

    pub fn set(&mut self, lit: bool) {
        // Active low; a failed write is cosmetic.
        let _ = if lit { self.pin.set_low() } else { self.pin.set_high() };
        self.lit = lit;
    }

    /// Lit for the duration of a cycle.
    pub fn busy(&mut self) {
        self.set(true);
    }

    pub fn idle(&mut self) {
        self.set(false);
    }

    /// Blink for roughly `duration_ms`, ending dark.
    pub fn blink_for(&mut self, duration_ms: u32, delay: &mut impl DelayNs) {
        let mut remaining = duration_ms;
        while remaining > 0 {
            self.set(true);
            delay.delay_ms(BLINK_HALF_PERIOD_MS);
            self.set(false);
            delay.delay_ms(BLINK_HALF_PERIOD_MS);
            remaining = remaining.saturating_sub(2 * BLINK_HALF_PERIOD_MS);
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
