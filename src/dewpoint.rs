//! Dew-point model (Magnus approximation).
//!
//! Converts an air temperature and relative humidity into the temperature
//! at which that air would saturate.  Two coefficient pairs are used,
//! selected by the sign of the temperature (over water above 0 °C, over
//! ice below).
//!
//! Every function here is pure.  Callers must exclude `rh <= 0`; the
//! sensor validation in [`crate::sensors`] guarantees `rh >= 1`.

/// Saturation vapour pressure at 0 °C (hPa).
const E0_HPA: f32 = 6.1078;

/// Magnus coefficients `(a, b)` for the given temperature.
#[inline]
fn magnus_coefficients(t: f32) -> (f32, f32) {
    if t >= 0.0 { (7.5, 237.3) } else { (7.6, 240.7) }
}

/// Saturation vapour pressure (hPa) at temperature `t` (°C).
pub fn saturation_vapor_pressure(t: f32) -> f32 {
    let (a, b) = magnus_coefficients(t);
    E0_HPA * 10f32.powf((a * t) / (b + t))
}

/// Actual vapour pressure (hPa) of air at `t` (°C) and `rh` (%).
pub fn vapor_pressure(t: f32, rh: f32) -> f32 {
    saturation_vapor_pressure(t) * (rh / 100.0)
}

/// Relative humidity (%) of air at `t` (°C) holding vapour pressure `dd`.
///
/// Inverse of [`vapor_pressure`] for a fixed temperature.
pub fn relative_humidity(t: f32, dd: f32) -> f32 {
    dd / saturation_vapor_pressure(t) * 100.0
}

/// Dew-point temperature (°C) for air at `t` (°C) and `rh` (%).
pub fn dew_point(t: f32, rh: f32) -> f32 {
    let (a, b) = magnus_coefficients(t);
    let v = (vapor_pressure(t, rh) / E0_HPA).log10();
    (b * v) / (a - v)
}
