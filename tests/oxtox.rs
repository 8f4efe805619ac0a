use dive_deco_planner::{
    oxtox::{cns_limit, otu_per_minute, CNS_SURFACE_HALF_TIME},
    DecompressionModel, DiveParameters, Gas, OxTox,
};

#[test]
fn test_otu_accumulation() {
    let mut ox_tox = OxTox::new();
    ox_tox.add_o2(30.0, 1.0);
    assert!((ox_tox.otu() - 30.0).abs() < 1e-9);
    ox_tox.add_o2(30.0, 0.4);
    assert!((ox_tox.otu() - 30.0).abs() < 1e-9);
    assert_eq!(ox_tox.max_pp_o2(), 1.0);
}

#[test]
fn test_otu_rate_above_one_bar() {
    let expected = libm::pow(1.8, 5.0 / 6.0);
    assert!((otu_per_minute(1.4) - expected).abs() < 1e-12);
}

#[test]
fn test_cns_accumulation() {
    let mut ox_tox = OxTox::new();
    ox_tox.add_o2(75.0, 1.4);
    assert!((ox_tox.cns() - 0.5).abs() < 1e-9);
}

#[test]
fn test_cns_limits_decrease() {
    let mut previous = f64::MAX;
    for step in 6..=16 {
        let limit = cns_limit(step as f64 / 10.0).unwrap();
        assert!(limit < previous);
        previous = limit;
    }
    assert_eq!(cns_limit(0.5), None);
    // extreme exposures bottom out at one minute
    assert_eq!(cns_limit(2.0), Some(1.0));
}

#[test]
fn test_surface_decay() {
    let mut ox_tox = OxTox::new();
    ox_tox.add_o2(60.0, 1.2);
    let otu = ox_tox.otu();
    let cns = ox_tox.cns();
    ox_tox.remove_o2(CNS_SURFACE_HALF_TIME);
    assert!((ox_tox.cns() - cns / 2.0).abs() < 1e-9);
    assert_eq!(ox_tox.otu(), otu);
}

#[test]
fn test_deltas_add_up() {
    let mut ox_tox = OxTox::new();
    ox_tox.add_o2(20.0, 1.3);
    let start = ox_tox;
    ox_tox.add_o2(10.0, 1.5);
    let delta = ox_tox.since(&start);
    let total = start + delta;
    assert!((total.otu() - ox_tox.otu()).abs() < 1e-9);
    assert!((total.cns() - ox_tox.cns()).abs() < 1e-9);

    let mut sum = OxTox::new();
    sum += start;
    sum += delta;
    assert!((sum.cns() - ox_tox.cns()).abs() < 1e-9);
}

#[test]
fn test_model_tracks_oxygen() {
    let params = DiveParameters::default();
    let mut model = DecompressionModel::new(&params);
    let ean50 = Gas::nitrox(0.5, &params);
    // 1.4 bar for 30 minutes
    let delta = model.const_depth(18.0, 30.0, &ean50, 0.0).unwrap();
    assert!((delta.cns() - 0.2).abs() < 1e-9);
    assert!((model.ox_tox().max_pp_o2() - 1.4).abs() < 1e-12);

    let otu = model.ox_tox().otu();
    model.surface_interval(CNS_SURFACE_HALF_TIME).unwrap();
    assert!((model.ox_tox().cns() - 0.1).abs() < 1e-9);
    assert_eq!(model.ox_tox().otu(), otu);
}

#[test]
fn test_rebreather_holds_setpoint() {
    let params = DiveParameters::default();
    let mut model = DecompressionModel::new(&params);
    let air = Gas::air(&params);
    let delta = model.const_depth(30.0, 10.0, &air, 1.3).unwrap();
    assert!((delta.max_pp_o2() - 1.3).abs() < 1e-12);
}
