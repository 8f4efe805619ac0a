use dive_deco_planner::{
    ceiling::{ceiling, gf_ceiling, max_ceiling, round_to_stop},
    compartment::Compartment,
    default_tissue_load, DecompressionModel, DiveParameters, Gas,
};

fn loaded(index: usize, pp_he: f64, pp_n2: f64, params: &DiveParameters) -> Compartment {
    let mut compartment = Compartment::new(index, params);
    compartment.set_loads(pp_he, pp_n2);
    compartment
}

#[test]
fn test_ceiling_saturated_at_surface() {
    let params = DiveParameters::default();
    let compartment = loaded(0, 0.0, default_tissue_load(&params), &params);
    assert_eq!(ceiling(&compartment, params.gf_low, &params), 0.0);
}

#[test]
fn test_ceiling_with_high_n2_load() {
    let params = DiveParameters::default();
    let compartment = loaded(2, 0.0, 50.0, &params);
    let result = ceiling(&compartment, 0.85, &params);
    assert!(result > 0.0, "Ceiling should be greater than 0 for high N2 load");
}

#[test]
fn test_ceiling_with_high_he_load() {
    let params = DiveParameters::default();
    let compartment = loaded(3, 50.0, 0.0, &params);
    let result = ceiling(&compartment, 0.85, &params);
    assert!(result > 0.0, "Ceiling should be greater than 0 for high He load");
}

#[test]
fn test_lower_gradient_factor_is_deeper() {
    let params = DiveParameters::default();
    let compartment = loaded(4, 10.0, 30.0, &params);
    let conservative = ceiling(&compartment, 0.3, &params);
    let liberal = ceiling(&compartment, 0.85, &params);
    assert!(conservative > liberal);
}

#[test]
fn test_max_ceiling_with_multiple_compartments() {
    let params = DiveParameters::default();
    let compartments: Vec<Compartment> = (0..16)
        .map(|i| loaded(i, 0.0, if i == 9 { 40.0 } else { 12.0 }, &params))
        .collect();
    let (depth, index) = max_ceiling(&compartments, 0.85, &params);
    assert_eq!(index, 9);
    assert_eq!(depth, ceiling(&compartments[9], 0.85, &params));
}

#[test]
fn test_max_ceiling_all_clear() {
    let params = DiveParameters::default();
    let compartments: Vec<Compartment> = (0..16)
        .map(|i| loaded(i, 0.0, default_tissue_load(&params), &params))
        .collect();
    assert_eq!(max_ceiling(&compartments, 0.3, &params), (0.0, 0));
}

#[test]
fn test_gf_ceiling_between_raw_ceilings() {
    let params = DiveParameters::default();
    let compartments: Vec<Compartment> = (0..16)
        .map(|i| loaded(i, 5.0, 30.0, &params))
        .collect();
    let low = max_ceiling(&compartments, params.gf_low, &params).0;
    let high = max_ceiling(&compartments, params.gf_high, &params).0;
    let line = gf_ceiling(&compartments, params.gf_low, params.gf_high, None, &params);
    assert!(line >= high - 1e-9, "{line} shallower than gf high {high}");
    assert!(line <= low + 1e-9, "{line} deeper than gf low {low}");
}

#[test]
fn test_model_ceiling_is_idempotent() {
    let params = DiveParameters::default();
    let mut model = DecompressionModel::new(&params);
    let air = Gas::air(&params);
    model.asc_dec(0.0, 40.0, 2.0, &air, 0.0).unwrap();
    model.const_depth(40.0, 25.0, &air, 0.0).unwrap();

    let first = model.ceiling(params.gf_low, params.gf_high);
    let second = model.ceiling(params.gf_low, params.gf_high);
    assert!(first > 0.0);
    assert_eq!(first.to_bits(), second.to_bits());
}

#[test]
fn test_round_to_stop_imperial() {
    let params = DiveParameters::imperial();
    assert_eq!(round_to_stop(21.0, &params), 30.0);
    assert_eq!(round_to_stop(2.0, &params), 10.0);
    assert_eq!(round_to_stop(0.0, &params), 0.0);
}
