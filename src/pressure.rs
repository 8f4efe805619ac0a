//! Surface pressure at altitude and depth/pressure conversions.
//!
//! Pressures are in depth units of water, so the sea-level surface pressure
//! equals the configured conversion factor (10 msw, 33 fsw).

use libm::pow;

use crate::DiveParameters;

const BAROMETRIC_HEIGHT: f64 = 44_330.8;
const BAROMETRIC_EXPONENT: f64 = 5.255_88;
const ALTITUDE_PRESSURE_SCALE: f64 = 1.000_159_001_890_97;
/// Fractional pressure drop per metre of the line bounding the curve near sea level.
const SEA_LEVEL_SLOPE: f64 = 1e-5;

/// Surface pressure at `altitude_m` metres above sea level, in the units of
/// `p_conversion`. Never exceeds the sea-level value.
pub fn altitude_pressure(altitude_m: f64, p_conversion: f64) -> f64 {
    if altitude_m <= 0.0 {
        return p_conversion;
    }
    let base = (1.0 - altitude_m / BAROMETRIC_HEIGHT).max(0.0);
    let pressure = p_conversion * ALTITUDE_PRESSURE_SCALE * pow(base, BAROMETRIC_EXPONENT);
    // the scaled curve sits above sea level for the first metre and a half;
    // the line keeps the result strictly below it there
    pressure.min(p_conversion * (1.0 - SEA_LEVEL_SLOPE * altitude_m))
}

/// Absolute ambient pressure at `depth`.
pub fn ambient_pressure(depth: f64, params: &DiveParameters) -> f64 {
    depth.max(0.0) + params.p_amb
}

pub fn depth_from_pressure(pressure: f64, params: &DiveParameters) -> f64 {
    (pressure - params.p_amb).max(0.0)
}

pub fn pressure_to_bar(pressure: f64, params: &DiveParameters) -> f64 {
    pressure / params.p_conversion
}

#[test]
fn test_sea_level_is_conversion_factor() {
    assert_eq!(altitude_pressure(0.0, 10.0), 10.0);
    assert_eq!(altitude_pressure(0.0, 33.0), 33.0);
    assert_eq!(altitude_pressure(-20.0, 10.0), 10.0);
}

#[test]
fn test_strictly_below_sea_level_just_above_it() {
    let mut previous = altitude_pressure(0.0, 10.0);
    for step in 1..=400 {
        let pressure = altitude_pressure(step as f64 * 0.01, 10.0);
        assert!(pressure < previous, "not decreasing at {}m", step as f64 * 0.01);
        previous = pressure;
    }
}
