//! Sixteen-compartment decompression model with oxygen exposure tracking.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use libm::{ceil, fabs};

use crate::ceiling::{gf_ceiling, max_ceiling};
use crate::compartment::Compartment;
use crate::gas::Gas;
use crate::oxtox::OxTox;
use crate::segment::{Segment, SegmentKind};
use crate::zhl16c::ZhL16cGf;
use crate::{default_tissue_load, DecoError, DiveParameters, EPSILON};

/// Longest sub-step used to integrate oxygen exposure during travel.
const OX_TOX_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ModelState {
    /// Saturated at the surface, nothing recorded yet.
    Initial,
    /// Recording a dive.
    Loading,
    /// Back at the surface with a clear ceiling.
    Stable,
    /// A computation left the finite range; the model refuses further updates.
    Unstable,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DecompressionModel {
    compartments: [Compartment; ZhL16cGf::COMPARTMENTS],
    ox_tox: OxTox,
    state: ModelState,
    first_stop: Option<f64>,
    params: DiveParameters,
}

/// Oxygen partial pressure in bar actually breathed at `depth`.
pub fn breathing_pp_o2(depth: f64, gas: &Gas, setpoint: f64, params: &DiveParameters) -> f64 {
    let p_amb_bar = (depth.max(0.0) + params.p_amb) / params.p_conversion;
    if setpoint > 0.0 {
        setpoint.max(gas.f_o2() * p_amb_bar).min(p_amb_bar)
    } else {
        gas.f_o2() * p_amb_bar
    }
}

/// Inspired (He, N2) partial pressures at `depth` in pressure units, after
/// water vapour.
pub fn inspired_inert(depth: f64, gas: &Gas, setpoint: f64, params: &DiveParameters) -> (f64, f64) {
    let p_alv = (depth.max(0.0) + params.p_amb - params.p_h2o).max(0.0);
    if setpoint <= 0.0 {
        return (p_alv * gas.f_he(), p_alv * gas.f_n2());
    }
    let p_o2 = (setpoint * params.p_conversion)
        .max(gas.f_o2() * p_alv)
        .min(p_alv);
    let inert_fraction = gas.f_he() + gas.f_n2();
    if inert_fraction <= 0.0 {
        return (0.0, 0.0);
    }
    let inert = p_alv - p_o2;
    (
        inert * gas.f_he() / inert_fraction,
        inert * gas.f_n2() / inert_fraction,
    )
}

impl DecompressionModel {
    /// Model saturated with air at the configured surface pressure.
    pub fn new(params: &DiveParameters) -> Self {
        let load = default_tissue_load(params);
        let compartments = core::array::from_fn(|i| {
            let mut compartment = Compartment::new(i, params);
            compartment.set_loads(0.0, load);
            compartment
        });
        DecompressionModel {
            compartments,
            ox_tox: OxTox::new(),
            state: ModelState::Initial,
            first_stop: None,
            params: *params,
        }
    }

    pub fn params(&self) -> &DiveParameters {
        &self.params
    }

    pub fn compartments(&self) -> &[Compartment; ZhL16cGf::COMPARTMENTS] {
        &self.compartments
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn ox_tox(&self) -> OxTox {
        self.ox_tox
    }

    /// Depth anchoring the gradient-factor line, once the first stop is known.
    pub fn first_stop(&self) -> Option<f64> {
        self.first_stop
    }

    pub fn set_first_stop(&mut self, depth: f64) {
        self.first_stop = Some(depth);
    }

    pub fn clear_first_stop(&mut self) {
        self.first_stop = None;
    }

    /// Integrate `segment` breathing `gas`. Returns the oxygen exposure it added.
    pub fn update_segment(&mut self, segment: &Segment, gas: &Gas) -> Result<OxTox, DecoError> {
        match segment.kind {
            SegmentKind::Dive | SegmentKind::Deco => {
                self.const_depth(segment.depth, segment.time, gas, segment.setpoint)
            }
            SegmentKind::AscDec { start_depth, .. } | SegmentKind::Waypoint { start_depth } => self
                .asc_dec(
                    start_depth,
                    segment.depth,
                    segment.time,
                    gas,
                    segment.setpoint,
                ),
            SegmentKind::Surface => {
                let before = self.ox_tox;
                self.surface_interval(segment.time)?;
                Ok(self.ox_tox.since(&before))
            }
        }
    }

    pub fn const_depth(
        &mut self,
        depth: f64,
        minutes: f64,
        gas: &Gas,
        setpoint: f64,
    ) -> Result<OxTox, DecoError> {
        self.asc_dec(depth, depth, minutes, gas, setpoint)
    }

    /// Linear travel from `start_depth` to `end_depth` over `minutes`.
    pub fn asc_dec(
        &mut self,
        start_depth: f64,
        end_depth: f64,
        minutes: f64,
        gas: &Gas,
        setpoint: f64,
    ) -> Result<OxTox, DecoError> {
        self.begin(end_depth)?;
        if minutes <= 0.0 {
            return Ok(OxTox::default());
        }
        let params = self.params;
        let (he_start, n2_start) = inspired_inert(start_depth, gas, setpoint, &params);
        let (he_end, n2_end) = inspired_inert(end_depth, gas, setpoint, &params);
        let rate_he = (he_end - he_start) / minutes;
        let rate_n2 = (n2_end - n2_start) / minutes;
        for compartment in self.compartments.iter_mut() {
            compartment.asc_dec(he_start, n2_start, rate_he, rate_n2, minutes);
        }

        let before = self.ox_tox;
        let steps = if fabs(end_depth - start_depth) < EPSILON {
            1
        } else {
            ceil(minutes / OX_TOX_STEP).max(1.0) as usize
        };
        let step = minutes / steps as f64;
        for i in 0..steps {
            let depth = start_depth + (end_depth - start_depth) * (i as f64 + 0.5) / steps as f64;
            self.ox_tox
                .add_o2(step, breathing_pp_o2(depth, gas, setpoint, &params));
        }

        self.check(end_depth)?;
        Ok(self.ox_tox.since(&before))
    }

    /// Off-gas on air at the surface. CNS decays, OTU stays, and the next
    /// dive anchors its own gradient-factor line.
    pub fn surface_interval(&mut self, minutes: f64) -> Result<(), DecoError> {
        self.begin(0.0)?;
        let pp_n2 = default_tissue_load(&self.params);
        for compartment in self.compartments.iter_mut() {
            compartment.const_depth(0.0, pp_n2, minutes);
        }
        self.ox_tox.remove_o2(minutes);
        self.first_stop = None;
        self.check(0.0)
    }

    /// Ceiling depth under the gradient-factor line from `gf_low` at the
    /// first stop to `gf_high` at the surface.
    pub fn ceiling(&self, gf_low: f64, gf_high: f64) -> f64 {
        gf_ceiling(&self.compartments, gf_low, gf_high, self.first_stop, &self.params)
    }

    /// Ceiling at one fixed gradient factor.
    pub fn raw_ceiling(&self, gf: f64) -> f64 {
        max_ceiling(&self.compartments, gf, &self.params).0
    }

    /// Index of the compartment setting the ceiling at `gf`.
    pub fn leading_compartment(&self, gf: f64) -> usize {
        max_ceiling(&self.compartments, gf, &self.params).1
    }

    /// Largest share of the surface M-value gradient in use, in percent, and
    /// the compartment using it.
    pub fn surface_gf(&self) -> (f64, usize) {
        let mut max_gf = 0.0;
        let mut leading = 0;
        for (i, compartment) in self.compartments.iter().enumerate() {
            let gf = compartment.gradient_at(self.params.p_amb) * 100.0;
            if gf > max_gf {
                max_gf = gf;
                leading = i;
            }
        }
        (max_gf, leading)
    }

    /// Fail when the ceiling lies above `depth` after an ascent has been
    /// made. A burst ceiling leaves the model unstable.
    pub fn check_ceiling(&mut self, depth: f64) -> Result<(), DecoError> {
        self.begin(depth)?;
        let ceiling = self.ceiling(self.params.gf_low, self.params.gf_high);
        if ceiling > depth + EPSILON {
            #[cfg(feature = "defmt")]
            defmt::warn!("ceiling {} burst at depth {}", ceiling, depth);
            self.state = ModelState::Unstable;
            return Err(DecoError::BurstCeiling { depth, ceiling });
        }
        Ok(())
    }

    /// Close a dive at `depth`. Only a surfaced model with a clear ceiling is stable.
    pub fn finish(&mut self, depth: f64) -> Result<(), DecoError> {
        self.check_ceiling(depth)?;
        if depth > EPSILON {
            let ceiling = self.ceiling(self.params.gf_low, self.params.gf_high);
            return Err(DecoError::BurstCeiling { depth, ceiling });
        }
        self.state = ModelState::Stable;
        Ok(())
    }

    fn begin(&mut self, depth: f64) -> Result<(), DecoError> {
        if self.state == ModelState::Unstable {
            return Err(DecoError::UnstableModel { depth });
        }
        self.state = ModelState::Loading;
        Ok(())
    }

    fn check(&mut self, depth: f64) -> Result<(), DecoError> {
        let finite = self.compartments.iter().all(Compartment::is_finite)
            && self.raw_ceiling(self.params.gf_low).is_finite();
        if finite {
            return Ok(());
        }
        #[cfg(feature = "defmt")]
        defmt::warn!("model unstable at depth {}", depth);
        self.state = ModelState::Unstable;
        Err(DecoError::UnstableModel { depth })
    }
}

#[test]
fn test_new_model_is_clear() {
    let params = DiveParameters::default();
    let model = DecompressionModel::new(&params);
    assert_eq!(model.state(), ModelState::Initial);
    assert_eq!(model.ceiling(params.gf_low, params.gf_high), 0.0);
    assert_eq!(model.ox_tox().otu(), 0.0);
}

#[test]
fn test_nan_input_makes_model_unstable() {
    let params = DiveParameters::default();
    let mut model = DecompressionModel::new(&params);
    let air = Gas::air(&params);
    let result = model.const_depth(30.0, f64::NAN, &air, 0.0);
    assert!(matches!(result, Err(DecoError::UnstableModel { .. })));
    assert_eq!(model.state(), ModelState::Unstable);
    assert!(model.const_depth(10.0, 1.0, &air, 0.0).is_err());
}

#[test]
fn test_burst_ceiling_makes_model_unstable() {
    let params = DiveParameters::default();
    let mut model = DecompressionModel::new(&params);
    let air = Gas::air(&params);
    model.asc_dec(0.0, 40.0, 2.0, &air, 0.0).unwrap();
    model.const_depth(40.0, 30.0, &air, 0.0).unwrap();
    model.asc_dec(40.0, 0.0, 4.0, &air, 0.0).unwrap();

    let result = model.finish(0.0);
    assert!(matches!(
        result,
        Err(DecoError::BurstCeiling { depth, ceiling }) if depth == 0.0 && ceiling > 0.0
    ));
    assert_eq!(model.state(), ModelState::Unstable);
    assert_eq!(
        model.const_depth(3.0, 1.0, &air, 0.0),
        Err(DecoError::UnstableModel { depth: 3.0 })
    );
}

#[test]
fn test_finish_at_depth_is_not_stable() {
    let params = DiveParameters::default();
    let mut model = DecompressionModel::new(&params);
    let air = Gas::air(&params);
    model.const_depth(10.0, 5.0, &air, 0.0).unwrap();
    assert!(matches!(model.finish(10.0), Err(DecoError::BurstCeiling { .. })));
    assert_eq!(model.state(), ModelState::Loading);
    model.asc_dec(10.0, 0.0, 1.0, &air, 0.0).unwrap();
    assert_eq!(model.finish(0.0), Ok(()));
    assert_eq!(model.state(), ModelState::Stable);
}
