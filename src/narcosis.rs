//! Equivalent narcotic depth.

use crate::gas::Gas;
use crate::{DiveParameters, FN2, FO2};

/// Inspired (He, O2, N2) fractions at `depth`. On a rebreather the loop holds
/// `setpoint` bar of oxygen (never below the diluent's own ppO2, never above
/// ambient) and the diluent's inert gases share the rest.
pub fn inspired_fractions(
    depth: f64,
    gas: &Gas,
    setpoint: f64,
    params: &DiveParameters,
) -> (f64, f64, f64) {
    if setpoint <= 0.0 {
        return (gas.f_he(), gas.f_o2(), gas.f_n2());
    }
    let p_amb_bar = (depth.max(0.0) + params.p_amb) / params.p_conversion;
    let f_o2 = (setpoint / p_amb_bar).max(gas.f_o2()).min(1.0);
    let inert = gas.f_he() + gas.f_n2();
    if inert <= 0.0 {
        return (0.0, f_o2, 0.0);
    }
    let rest = 1.0 - f_o2;
    (rest * gas.f_he() / inert, f_o2, rest * gas.f_n2() / inert)
}

/// Depth breathing air that is as narcotic as `gas` at `depth`. Oxygen and
/// helium count with the configured narcotic weights, on both sides.
pub fn equivalent_narcotic_depth(
    depth: f64,
    gas: &Gas,
    setpoint: f64,
    params: &DiveParameters,
) -> f64 {
    let (f_he, f_o2, f_n2) = inspired_fractions(depth, gas, setpoint, params);
    let narcotic = f_n2 + params.o2_narcotic * f_o2 + params.he_narcotic * f_he;
    let reference = FN2 + params.o2_narcotic * FO2;
    let p_amb = depth.max(0.0) + params.p_amb;
    (p_amb * narcotic / reference - params.p_amb).max(0.0)
}

#[test]
fn test_air_end_is_depth() {
    let params = DiveParameters::default();
    let air = Gas::air(&params);
    let end = equivalent_narcotic_depth(30.0, &air, 0.0, &params);
    assert!(libm::fabs(end - 30.0) < 1e-9);
}
