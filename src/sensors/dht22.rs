//! DHT22 (AM2302) single-wire humidity/temperature sensor.
//!
//! ## Protocol
//!
//! 1. Host pulls the data line low for ≥1 ms, then releases it.
//! 2. Sensor answers with 80 µs low + 80 µs high.
//! 3. 40 bits follow; each bit is ~50 µs low, then high for ~26 µs (`0`)
//!    or ~70 µs (`1`).  Sampling the line 35 µs after the rising edge
//!    distinguishes the two.
//! 4. Bytes: humidity ×10 (16 bit), temperature ×10 (15 bit + sign bit),
//!    checksum = low byte of the sum of the first four.
//!
//! The driver is generic over `embedded-hal` 1.0 traits so it runs on the
//! ESP-IDF open-drain `PinDriver` and can be unit-tested on the host.
//! Failures are reported as `f32::NAN`, which the sensor hub rejects.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::debug;

use crate::app::ports::ClimateSensor;

/// Polling budget (µs) for any single line transition.
const EDGE_TIMEOUT_US: u32 = 100;
/// Sample point after a bit's rising edge.
const BIT_SAMPLE_DELAY_US: u32 = 35;
/// Host start-signal low time.
const START_LOW_US: u32 = 1_100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhtError {
    /// The line did not change level in time.
    Timeout,
    /// Checksum byte does not match the payload.
    Checksum,
    /// The pin driver reported an error.
    Pin,
}

/// One decoded measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub humidity: f32,
    pub temperature: f32,
}

/// Decode the five raw bytes of a DHT22 frame.
pub fn decode(frame: [u8; 5]) -> Result<Measurement, DhtError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(DhtError::Checksum);
    }
    let humidity = f32::from(u16::from_be_bytes([frame[0], frame[1]])) / 10.0;
    let magnitude = f32::from(u16::from_be_bytes([frame[2] & 0x7F, frame[3]])) / 10.0;
    let temperature = if frame[2] & 0x80 != 0 { -magnitude } else { magnitude };
    Ok(Measurement { humidity, temperature })
}

/// DHT22 driver on an open-drain data pin.
pub struct Dht22<P, D> {
    pin: P,
    delay: D,
    /// Temperature from the transaction started by the last humidity read.
    pending_temperature: Option<f32>,
}

impl<P, D> Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(mut pin: P, delay: D) -> Self {
        // Idle level is high; a failure here surfaces on the first read.
        let _ = pin.set_high();
        Self {
            pin,
            delay,
            pending_temperature: None,
        }
    }

    /// Run one full transaction.
    pub fn measure(&mut self) -> Result<Measurement, DhtError> {
        self.pin.set_low().map_err(|_| DhtError::Pin)?;
        self.delay.delay_us(START_LOW_US);
        self.pin.set_high().map_err(|_| DhtError::Pin)?;

        // Sensor response: low, high, then the first bit's low phase.
        self.wait_for(false)?;
        self.wait_for(true)?;
        self.wait_for(false)?;

        let mut frame = [0u8; 5];
        for byte in &mut frame {
            for _ in 0..8 {
                *byte = (*byte << 1) | u8::from(self.read_bit()?);
            }
        }
        decode(frame)
    }

    fn read_bit(&mut self) -> Result<bool, DhtError> {
        self.wait_for(true)?;
        self.delay.delay_us(BIT_SAMPLE_DELAY_US);
        let high = self.pin.is_high().map_err(|_| DhtError::Pin)?;
        if high {
            self.wait_for(false)?;
        }
        Ok(high)
    }

    fn wait_for(&mut self, level_high: bool) -> Result<(), DhtError> {
        for _ in 0..EDGE_TIMEOUT_US {
            if self.pin.is_high().map_err(|_| DhtError::Pin)? == level_high {
                return Ok(());
            }
            self.delay.delay_us(1);
        }
        Err(DhtError::Timeout)
    }
}

impl<P, D> ClimateSensor for Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn read_humidity(&mut self) -> f32 {
        match self.measure() {
            Ok(m) => {
                self.pending_temperature = Some(m.temperature);
                m.humidity
            }
            Err(e) => {
                debug!("DHT22 read failed: {:?}", e);
                self.pending_temperature = None;
                f32::NAN
            }
        }
    }

    fn read_temperature(&mut self) -> f32 {
        if let Some(t) = self.pending_temperature.take() {
            return t;
        }
        match self.measure() {
            Ok(m) => m.temperature,
            Err(e) => {
                debug!("DHT22 read failed: {:?}", e);
                f32::NAN
            }
        }
    }
}
