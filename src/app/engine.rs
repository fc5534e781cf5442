//! Ventilation decision engine.
//!
//! Fuses one [`SensorSnapshot`] and the current [`VentConfig`] into a relay
//! command and a reason.  The rules form an ordered precedence chain; each
//! later rule may override the decision of an earlier one:
//!
//! ```text
//!  dew-point delta ─▶ hysteresis band ─▶ safety clamps
//!        ─▶ stale-ventilation override (arm / expire) ─▶ manual mode
//!        ─▶ edge detection
//! ```
//!
//! The only persistent state is the [`OverrideState`].  The previous relay
//! command is an explicit input so every call is reproducible in tests.

use core::fmt;

use log::info;

use crate::config::{OperatingMode, VentConfig};
use crate::dewpoint::dew_point;
use crate::error::SensorFault;
use crate::sensors::SensorSnapshot;

// ---------------------------------------------------------------------------
// State & results
// ---------------------------------------------------------------------------

/// Stale-ventilation override bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideState {
    /// The override currently forces the relay on.
    pub active: bool,
    /// Uptime (ms) of the last actual relay transition.  May be negative:
    /// at boot it is set one full stale period into the past.
    pub last_change_ms: i64,
}

/// Why the relay ended up in its final state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecisionReason {
    /// Dew-point delta above threshold + hysteresis.
    AboveThreshold { delta: f32, threshold: i32, hysteresis: i32 },
    /// Dew-point delta at or below the threshold.
    AtOrBelowThreshold { delta: f32, threshold: i32 },
    /// Inside the dead band; previous decision kept.
    Hysteresis,
    InsideTooCold { temp: f32, min: i32 },
    OutsideTooCold { temp: f32, min: i32 },
    OutsideTooWarm { temp: f32, max: i32 },
    /// Stale-ventilation override forces the relay on.
    OverrideActive,
    /// Mode is ON or OFF.
    Manual(OperatingMode),
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AboveThreshold { delta, threshold, hysteresis } => write!(
                f,
                "DeltaDP > (MIN_Delta + HYSTERESIS): {:.2} > {} + {}",
                delta, threshold, hysteresis
            ),
            Self::AtOrBelowThreshold { delta, threshold } => {
                write!(f, "DeltaDP <= MIN_Delta: {:.2} <= {}", delta, threshold)
            }
            Self::Hysteresis => f.write_str("Hysteresis phase"),
            Self::InsideTooCold { temp, min } => {
                write!(f, "tempInside < TEMPINSIDE_MIN: {:.2} < {}", temp, min)
            }
            Self::OutsideTooCold { temp, min } => {
                write!(f, "tempOutside < TEMPOUTSIDE_MIN: {:.2} < {}", temp, min)
            }
            Self::OutsideTooWarm { temp, max } => {
                write!(f, "tempOutside > TEMPOUTSIDE_MAX: {:.2} > {}", temp, max)
            }
            Self::OverrideActive => f.write_str("ventilation override active"),
            Self::Manual(mode) => write!(f, "requested mode == {}", mode),
        }
    }
}

/// Output of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionResult {
    pub relay_on: bool,
    pub reason: DecisionReason,
    pub dewpoint_inside: f32,
    pub dewpoint_outside: f32,
    /// `dewpoint_inside - dewpoint_outside`.
    pub delta_dewpoint: f32,
    /// The relay state differs from the previous command.
    pub relay_changed: bool,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct VentilationEngine {
    state: OverrideState,
}

impl VentilationEngine {
    /// Create the engine at boot.
    ///
    /// The last transition is placed exactly one stale period before
    /// `now_ms`, so the override cannot arm on the very first cycle.
    pub fn new(config: &VentConfig, now_ms: u64) -> Self {
        Self {
            state: OverrideState {
                active: false,
                last_change_ms: now_ms as i64 - config.max_without_ventilation_ms(),
            },
        }
    }

    /// Restore a specific override state (diagnostics, tests).
    pub fn with_state(state: OverrideState) -> Self {
        Self { state }
    }

    pub fn override_state(&self) -> OverrideState {
        self.state
    }

    /// Evaluate one cycle.
    ///
    /// `previous_relay_on` is the command issued on the previous cycle; it
    /// is retained inside the hysteresis band and used for edge detection.
    pub fn evaluate(
        &mut self,
        snap: &SensorSnapshot,
        config: &VentConfig,
        previous_relay_on: bool,
        now_ms: u64,
    ) -> Result<DecisionResult, SensorFault> {
        // 1. No decision on invalid data.
        if let Some(fault) = snap.fault {
            return Err(fault);
        }

        // 2. Dew points.
        let dewpoint_inside = dew_point(snap.temp_inside, snap.humidity_inside);
        let dewpoint_outside = dew_point(snap.temp_outside, snap.humidity_outside);
        let delta = dewpoint_inside - dewpoint_outside;

        // 3. Hysteresis band.
        let threshold = config.min_dewpoint_delta;
        let hysteresis = config.hysteresis;
        let (mut on, mut reason) = if delta > (threshold + hysteresis) as f32 {
            (true, DecisionReason::AboveThreshold { delta, threshold, hysteresis })
        } else if delta <= threshold as f32 {
            (false, DecisionReason::AtOrBelowThreshold { delta, threshold })
        } else {
            (previous_relay_on, DecisionReason::Hysteresis)
        };

        // 4. Safety clamps, first match wins.
        if on {
            let clamp = if snap.temp_inside < config.min_inside_temp as f32 {
                Some(DecisionReason::InsideTooCold {
                    temp: snap.temp_inside,
                    min: config.min_inside_temp,
                })
            } else if snap.temp_outside < config.min_outside_temp as f32 {
                Some(DecisionReason::OutsideTooCold {
                    temp: snap.temp_outside,
                    min: config.min_outside_temp,
                })
            } else if snap.temp_outside > config.max_outside_temp as f32 {
                Some(DecisionReason::OutsideTooWarm {
                    temp: snap.temp_outside,
                    max: config.max_outside_temp,
                })
            } else {
                None
            };
            if let Some(r) = clamp {
                on = false;
                reason = r;
            }
        }

        // 5./6. Stale-ventilation override.
        let now = now_ms as i64;
        let since_change = now - self.state.last_change_ms;
        let was_active = self.state.active;

        if snap.humidity_inside >= config.min_humidity_for_override as f32
            && !on
            && since_change > config.max_without_ventilation_ms()
        {
            if !self.state.active {
                info!(
                    "ventilator off for {} hours - turning on",
                    config.max_hours_without_ventilation
                );
            }
            self.state.active = true;
        }

        if was_active && since_change > config.override_ms() {
            info!("ventilation override expired after {} minutes", config.override_minutes);
            self.state.active = false;
        }

        // 7. Override beats manual mode.
        if self.state.active {
            on = true;
            reason = DecisionReason::OverrideActive;
        } else if config.mode != OperatingMode::Auto {
            on = config.mode == OperatingMode::On;
            reason = DecisionReason::Manual(config.mode);
        }

        // 8. Edge detection.
        let relay_changed = on != previous_relay_on;
        if relay_changed {
            self.state.last_change_ms = now;
        }

        Ok(DecisionResult {
            relay_on: on,
            reason,
            dewpoint_inside,
            dewpoint_outside,
            delta_dewpoint: delta,
            relay_changed,
        })
    }
}
