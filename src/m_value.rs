/// Bühlmann M-value: the tolerated tissue pressure at `amb_pressure`.
pub fn calculate_m_values(amb_pressure: f64, a: f64, b: f64) -> f64 {
    amb_pressure / b + a
}

/// M-value line scaled by a gradient factor between ambient and the raw M-value.
pub fn gf_m_value(amb_pressure: f64, a: f64, b: f64, gf: f64) -> f64 {
    amb_pressure + gf * (calculate_m_values(amb_pressure, a, b) - amb_pressure)
}

/// Lowest ambient pressure at which `p_tissue` stays on the gradient-factor
/// M-value line. Inverse of [`gf_m_value`].
pub fn tolerated_ambient(p_tissue: f64, a: f64, b: f64, gf: f64) -> f64 {
    (p_tissue - a * gf) / (gf / b + 1.0 - gf)
}

#[test]
fn test_tolerated_ambient_inverts_m_value() {
    let (a, b, gf) = (2.327, 0.9653, 0.7);
    let p_tissue = gf_m_value(25.0, a, b, gf);
    assert!(libm::fabs(tolerated_ambient(p_tissue, a, b, gf) - 25.0) < 1e-9);
}
