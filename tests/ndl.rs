use dive_deco_planner::{
    ndl::{ndl, NDL_CUT_OFF},
    DecompressionModel, DiveParameters, Gas,
};

struct TableNdl {
    depth: f64,
    min: f64,
    max: f64,
}

#[test]
fn test_ndl_table() {
    let params = DiveParameters::new(1.0, 1.0);
    let air = Gas::air(&params);
    let model = DecompressionModel::new(&params);

    let table_ndl = [
        TableNdl { depth: 50.0, min: 3.0, max: 6.0 },
        TableNdl { depth: 40.0, min: 6.0, max: 10.0 },
        TableNdl { depth: 30.0, min: 14.0, max: 18.0 },
        TableNdl { depth: 24.0, min: 25.0, max: 32.0 },
        TableNdl { depth: 21.0, min: 35.0, max: 45.0 },
        TableNdl { depth: 18.0, min: 50.0, max: 65.0 },
        TableNdl { depth: 15.0, min: 80.0, max: 100.0 },
        TableNdl { depth: 12.0, min: 150.0, max: 200.0 },
    ];

    for row in table_ndl.iter() {
        let result = ndl(&model, row.depth, &air, 0.0).unwrap();
        assert!(
            result >= row.min && result <= row.max,
            "Depth: {}m - NDL: {}min - expected {}..{}min",
            row.depth,
            result,
            row.min,
            row.max
        );
    }
}

#[test]
fn test_ndl_gradient_factor_is_conservative() {
    let liberal = DiveParameters::new(1.0, 1.0);
    let conservative = DiveParameters::new(0.7, 0.3);
    let air = Gas::air(&liberal);
    let a = ndl(&DecompressionModel::new(&liberal), 30.0, &air, 0.0).unwrap();
    let b = ndl(&DecompressionModel::new(&conservative), 30.0, &air, 0.0).unwrap();
    assert!(b < a);
}

#[test]
fn test_ndl_nitrox_is_longer() {
    let params = DiveParameters::default();
    let model = DecompressionModel::new(&params);
    let air = Gas::air(&params);
    let ean32 = Gas::nitrox(0.32, &params);
    let on_air = ndl(&model, 30.0, &air, 0.0).unwrap();
    let on_nitrox = ndl(&model, 30.0, &ean32, 0.0).unwrap();
    assert!(on_nitrox > on_air);
}

#[test]
fn test_ndl_zero_in_deco() {
    let params = DiveParameters::default();
    let air = Gas::air(&params);
    let mut model = DecompressionModel::new(&params);
    model.const_depth(40.0, 30.0, &air, 0.0).unwrap();
    assert_eq!(ndl(&model, 40.0, &air, 0.0).unwrap(), 0.0);
}

#[test]
fn test_ndl_leaves_model_untouched() {
    let params = DiveParameters::default();
    let air = Gas::air(&params);
    let mut model = DecompressionModel::new(&params);
    model.const_depth(20.0, 10.0, &air, 0.0).unwrap();
    let before = model.clone();
    let _ = ndl(&model, 20.0, &air, 0.0).unwrap();
    assert_eq!(model, before);
}

#[test]
fn test_ndl_capped() {
    let params = DiveParameters::default();
    let air = Gas::air(&params);
    let model = DecompressionModel::new(&params);
    assert_eq!(ndl(&model, 5.0, &air, 0.0).unwrap(), NDL_CUT_OFF);
}
