use dive_deco_planner::{
    pressure::{altitude_pressure, ambient_pressure, depth_from_pressure, pressure_to_bar},
    DiveParameters,
};

#[test]
fn test_altitude_pressure_values() {
    let expected = [
        (0.0, 10.0),
        (500.0, 9.42275031436),
        (1000.0, 8.87134076736),
        (2000.0, 7.84681518262),
        (3000.0, 6.92027550272),
        (4000.0, 6.08438547879),
        (5000.0, 5.33219849967),
    ];
    for (altitude, pressure) in expected {
        let result = altitude_pressure(altitude, 10.0);
        assert!(
            (result - pressure).abs() < 1e-9,
            "altitude {altitude}: {result} != {pressure}"
        );
    }
}

#[test]
fn test_altitude_pressure_decreases() {
    let mut previous = altitude_pressure(0.0, 10.0);
    for step in 1..=60 {
        let pressure = altitude_pressure(step as f64 * 100.0, 10.0);
        assert!(pressure < previous, "not decreasing at {}m", step * 100);
        previous = pressure;
    }
}

#[test]
fn test_altitude_pressure_decreases_near_sea_level() {
    let mut previous = altitude_pressure(0.0, 33.0);
    for step in 1..=2000 {
        let altitude = step as f64 * 0.005;
        let pressure = altitude_pressure(altitude, 33.0);
        assert!(pressure < previous, "not decreasing at {altitude}m");
        previous = pressure;
    }
}

#[test]
fn test_altitude_in_feet_of_seawater() {
    let metric = altitude_pressure(2000.0, 10.0);
    let imperial = altitude_pressure(2000.0, 33.0);
    assert!((imperial / 33.0 - metric / 10.0).abs() < 1e-12);
}

#[test]
fn test_altitude_parameters() {
    let params = DiveParameters::default().with_altitude(1000.0);
    assert!((params.p_amb - 8.87134076736).abs() < 1e-9);
    assert_eq!(params.p_conversion, 10.0);
}

#[test]
fn test_depth_pressure_conversions() {
    let params = DiveParameters::default();
    assert_eq!(ambient_pressure(30.0, &params), 40.0);
    assert_eq!(ambient_pressure(-3.0, &params), 10.0);
    assert_eq!(depth_from_pressure(40.0, &params), 30.0);
    assert_eq!(depth_from_pressure(5.0, &params), 0.0);
    assert_eq!(pressure_to_bar(40.0, &params), 4.0);
}
