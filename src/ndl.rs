use crate::gas::Gas;
use crate::model::DecompressionModel;
use crate::DecoError;

/// NDL reported when the ceiling never appears within this many minutes.
pub const NDL_CUT_OFF: f64 = 999.0;

/// Minutes that can still be spent at `depth` breathing `gas` before a stop is
/// required at `gf_high`. The model is not modified.
pub fn ndl(
    model: &DecompressionModel,
    depth: f64,
    gas: &Gas,
    setpoint: f64,
) -> Result<f64, DecoError> {
    let gf_high = model.params().gf_high;
    if model.raw_ceiling(gf_high) > 0.0 {
        return Ok(0.0);
    }

    // step a minute at a time while the ceiling stays at the surface
    let mut sim = model.clone();
    let mut bottom_time = 0.0;
    loop {
        sim.const_depth(depth, 1.0, gas, setpoint)?;
        if sim.raw_ceiling(gf_high) > 0.0 {
            #[cfg(feature = "defmt")]
            defmt::debug!("ndl at {}: {} min", depth, bottom_time);
            return Ok(bottom_time);
        }
        bottom_time += 1.0;
        if bottom_time >= NDL_CUT_OFF {
            return Ok(NDL_CUT_OFF);
        }
    }
}

#[test]
fn test_ndl_shrinks_with_depth() {
    let params = crate::DiveParameters::default();
    let model = DecompressionModel::new(&params);
    let air = Gas::air(&params);
    let shallow = ndl(&model, 18.0, &air, 0.0).unwrap();
    let deep = ndl(&model, 30.0, &air, 0.0).unwrap();
    assert!(deep < shallow);
    assert!(deep > 0.0);
    assert_eq!(ndl(&model, 3.0, &air, 0.0).unwrap(), NDL_CUT_OFF);
}
