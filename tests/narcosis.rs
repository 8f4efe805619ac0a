use dive_deco_planner::{
    narcosis::{equivalent_narcotic_depth, inspired_fractions},
    DiveParameters, Gas,
};

fn params(o2_narcotic: f64, he_narcotic: f64) -> DiveParameters {
    DiveParameters {
        o2_narcotic,
        he_narcotic,
        ..Default::default()
    }
}

#[test]
fn test_end_oxygen_not_narcotic() {
    let params = params(0.0, 0.0);
    let ean30 = Gas::nitrox(0.30, &params);
    let end = equivalent_narcotic_depth(40.0, &ean30, 0.0, &params);
    assert!((end - 34.0).abs() < 0.5, "END {end}");
}

#[test]
fn test_end_oxygen_fully_narcotic() {
    let params = params(1.0, 0.0);
    let ean30 = Gas::nitrox(0.30, &params);
    let end = equivalent_narcotic_depth(40.0, &ean30, 0.0, &params);
    assert!((end - 40.0).abs() < 1e-9, "END {end}");
}

#[test]
fn test_end_with_helium() {
    let params = params(1.0, 0.0);
    let trimix = Gas::trimix(0.39, 0.30, &params);
    let end = equivalent_narcotic_depth(40.0, &trimix, 0.0, &params);
    assert!((end - 20.0).abs() < 1.0, "END {end}");

    let params = self::params(0.0, 0.0);
    let trimix = Gas::trimix(0.39, 0.30, &params);
    let end = equivalent_narcotic_depth(40.0, &trimix, 0.0, &params);
    assert!((end - 10.0).abs() < 0.5, "END {end}");
}

#[test]
fn test_end_imperial() {
    let params = DiveParameters {
        o2_narcotic: 0.0,
        he_narcotic: 0.0,
        ..DiveParameters::imperial()
    };
    let air = Gas::air(&params);
    let end = equivalent_narcotic_depth(99.0, &air, 0.0, &params);
    assert!((end - 99.0).abs() < 1e-9, "END {end}");
}

#[test]
fn test_end_clamped_at_surface() {
    let params = params(0.0, 0.0);
    let heliox = Gas::trimix(0.79, 0.21, &params);
    assert_eq!(equivalent_narcotic_depth(30.0, &heliox, 0.0, &params), 0.0);
}

#[test]
fn test_rebreather_fractions() {
    let params = params(0.0, 0.0);
    let air = Gas::air(&params);
    let (f_he, f_o2, f_n2) = inspired_fractions(30.0, &air, 1.2, &params);
    assert_eq!(f_he, 0.0);
    assert!((f_o2 - 0.3).abs() < 1e-12);
    assert!((f_n2 - 0.7).abs() < 1e-12);

    // setpoint below the diluent's own ppO2
    let (_, f_o2, _) = inspired_fractions(30.0, &air, 0.5, &params);
    assert_eq!(f_o2, 0.21);

    let oc = equivalent_narcotic_depth(30.0, &air, 0.0, &params);
    let ccr = equivalent_narcotic_depth(30.0, &air, 1.2, &params);
    assert!(ccr < oc);
}
