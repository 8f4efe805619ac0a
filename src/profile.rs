//! Turns a dive plan into a resolved schedule: descents, levels, ascents,
//! decompression stops and gas switches.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use alloc::string::String;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use libm::{ceil, fabs, floor};

use crate::ceiling::{gf_at_depth, round_to_stop};
use crate::gas::{Gas, GasId, GasList};
use crate::model::{breathing_pp_o2, DecompressionModel};
use crate::narcosis::equivalent_narcotic_depth;
use crate::oxtox::OxTox;
use crate::segment::{Segment, SegmentKind};
use crate::{DecoError, DiveParameters, EPSILON};

/// A stop still holding after this many minutes is treated as unsolvable.
const MAX_STOP_TIME: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProfileWarning {
    /// Segment `segment` breathes more oxygen than `max_ppo2`.
    PpO2Exceeded { segment: usize, pp_o2: f64 },
    /// Segment `segment` is more narcotic than `max_end`.
    EndExceeded { segment: usize, end: f64 },
    /// CNS clock past 100 % (as a fraction).
    CnsExceeded { cns: f64 },
    /// A waypoint ascent to `depth` over `time` minutes would have broken the
    /// ceiling and was decompressed instead. Its row is replaced by the stops.
    WaypointDecompressed { depth: f64, time: f64 },
}

/// A resolved dive. Only [`ProfileBuilder::build`] creates one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Profile {
    segments: Vec<Segment>,
    gases: GasList,
    model: DecompressionModel,
    params: DiveParameters,
    gas_usage: BTreeMap<GasId, f64>,
    max_cns: f64,
    surface_interval: Option<f64>,
    warnings: Vec<ProfileWarning>,
}

impl Profile {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn gases(&self) -> &GasList {
        &self.gases
    }

    /// Model state after surfacing.
    pub fn model(&self) -> &DecompressionModel {
        &self.model
    }

    pub fn params(&self) -> &DiveParameters {
        &self.params
    }

    pub fn ox_tox(&self) -> OxTox {
        self.model.ox_tox()
    }

    /// Surface volume breathed from each gas.
    pub fn gas_usage(&self) -> &BTreeMap<GasId, f64> {
        &self.gas_usage
    }

    pub fn run_time(&self) -> f64 {
        self.segments.last().map_or(0.0, |s| s.run_time)
    }

    pub fn max_depth(&self) -> f64 {
        self.segments.iter().map(|s| s.depth).fold(0.0, f64::max)
    }

    pub fn max_pp_o2(&self) -> f64 {
        self.segments.iter().map(|s| s.pp_o2).fold(0.0, f64::max)
    }

    pub fn max_cns(&self) -> f64 {
        self.max_cns
    }

    /// Total time spent holding at stops.
    pub fn deco_time(&self) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.is_stop())
            .map(|s| s.time)
            .sum()
    }

    /// Depth of the first decompression stop, `None` for a no-stop dive.
    pub fn first_stop(&self) -> Option<f64> {
        self.segments.iter().find(|s| s.is_stop()).map(|s| s.depth)
    }

    pub fn surface_interval(&self) -> Option<f64> {
        self.surface_interval
    }

    pub fn warnings(&self) -> &[ProfileWarning] {
        &self.warnings
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Collects the planned legs of a dive and resolves them into a [`Profile`].
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    params: DiveParameters,
    gases: GasList,
    input: Vec<Segment>,
    model: DecompressionModel,
    surface_interval: Option<f64>,
}

impl ProfileBuilder {
    pub fn new(params: DiveParameters, gases: GasList) -> Self {
        ProfileBuilder {
            model: DecompressionModel::new(&params),
            params,
            gases,
            input: Vec::new(),
            surface_interval: None,
        }
    }

    /// Next dive after `minutes` at the surface, starting from the tissue and
    /// oxygen state `previous` ended with.
    pub fn repetitive(previous: &Profile, minutes: f64) -> Self {
        ProfileBuilder {
            params: previous.params,
            gases: previous.gases.clone(),
            input: Vec::new(),
            model: previous.model.clone(),
            surface_interval: Some(minutes.max(0.0)),
        }
    }

    pub fn gases_mut(&mut self) -> &mut GasList {
        &mut self.gases
    }

    pub fn push(&mut self, segment: Segment) {
        self.input.push(segment);
    }

    pub fn segment(mut self, segment: Segment) -> Self {
        self.push(segment);
        self
    }

    pub fn segments(mut self, segments: impl IntoIterator<Item = Segment>) -> Self {
        self.input.extend(segments);
        self
    }

    pub fn build(&self) -> Result<Profile, DecoError> {
        self.params.validate()?;
        let input: Vec<Segment> = self.input.iter().filter(|s| s.enabled).copied().collect();
        let Some(first) = input.first() else {
            return Err(DecoError::EmptyPlan);
        };
        if let Some(leg) = input.iter().find(|s| self.gases.get(s.gas).is_none()) {
            return Err(DecoError::UnknownGas(leg.gas));
        }

        let mut run = Run {
            params: self.params,
            gases: &self.gases,
            model: self.model.clone(),
            segments: Vec::new(),
            gas_usage: BTreeMap::new(),
            warnings: Vec::new(),
            depth: 0.0,
            run_time: 0.0,
            gas: first.gas,
            setpoint: first.setpoint,
            max_cns: self.model.ox_tox().cns(),
        };

        if let Some(minutes) = self.surface_interval {
            run.append(Segment::surface(minutes, first.gas))?;
        }
        for leg in &input {
            match leg.kind {
                SegmentKind::Surface => {
                    run.decompress_to(0.0)?;
                    run.append(*leg)?;
                }
                SegmentKind::Waypoint { .. } => run.waypoint(leg)?,
                _ => run.level(leg)?,
            }
        }
        run.decompress_to(0.0)?;
        run.model.finish(run.depth)?;

        let cns = run.model.ox_tox().cns();
        if cns > 1.0 {
            run.warnings.push(ProfileWarning::CnsExceeded { cns });
        }

        Ok(Profile {
            segments: run.segments,
            gases: self.gases.clone(),
            model: run.model,
            params: self.params,
            gas_usage: run.gas_usage,
            max_cns: run.max_cns,
            surface_interval: self.surface_interval,
            warnings: run.warnings,
        })
    }
}

/// Working state while a plan is resolved.
struct Run<'a> {
    params: DiveParameters,
    gases: &'a GasList,
    model: DecompressionModel,
    segments: Vec<Segment>,
    gas_usage: BTreeMap<GasId, f64>,
    warnings: Vec<ProfileWarning>,
    depth: f64,
    run_time: f64,
    gas: GasId,
    setpoint: f64,
    max_cns: f64,
}

impl Run<'_> {
    fn lookup(&self, id: GasId) -> Result<Gas, DecoError> {
        self.gases.get(id).copied().ok_or(DecoError::UnknownGas(id))
    }

    /// Integrate `segment` and append it.
    fn append(&mut self, segment: Segment) -> Result<(), DecoError> {
        let gas = self.lookup(segment.gas)?;
        self.model.update_segment(&segment, &gas)?;
        self.record(segment, &gas);
        Ok(())
    }

    /// Append a segment the model has already integrated.
    fn record(&mut self, segment: Segment, gas: &Gas) {
        let params = self.params;
        let mut segment = self.continue_ascent(segment);
        if matches!(segment.kind, SegmentKind::Surface) {
            self.run_time = 0.0;
            segment.run_time = 0.0;
        } else {
            let start = segment.start_depth();
            self.run_time += segment.time;
            segment.run_time = self.run_time;
            segment.pp_o2 = breathing_pp_o2(start, gas, segment.setpoint, &params).max(
                breathing_pp_o2(segment.depth, gas, segment.setpoint, &params),
            );
            segment.end = equivalent_narcotic_depth(start, gas, segment.setpoint, &params).max(
                equivalent_narcotic_depth(segment.depth, gas, segment.setpoint, &params),
            );
            if segment.setpoint <= 0.0 {
                let rmv = if segment.is_stop() || segment.is_ascent() {
                    params.deco_rmv
                } else {
                    params.dive_rmv
                };
                let p_bar = (segment.average_depth() + params.p_amb) / params.p_conversion;
                segment.gas_used = p_bar * segment.time * rmv;
                *self.gas_usage.entry(segment.gas).or_insert(0.0) += segment.gas_used;
            }
        }
        segment.ceiling = self.model.ceiling(params.gf_low, params.gf_high);

        let index = self.segments.len();
        if segment.pp_o2 > params.max_ppo2 + EPSILON {
            self.warnings.push(ProfileWarning::PpO2Exceeded {
                segment: index,
                pp_o2: segment.pp_o2,
            });
        }
        if segment.end > params.max_end + EPSILON {
            self.warnings.push(ProfileWarning::EndExceeded {
                segment: index,
                end: segment.end,
            });
        }
        self.max_cns = self.max_cns.max(self.model.ox_tox().cns());
        self.depth = segment.depth;
        self.segments.push(segment);
    }

    /// An ascent picking up where the previous one stopped, with no hold in
    /// between, replaces it with a single leg.
    fn continue_ascent(&mut self, segment: Segment) -> Segment {
        let SegmentKind::AscDec { start_depth, .. } = segment.kind else {
            return segment;
        };
        let Some(last) = self.segments.last().copied() else {
            return segment;
        };
        let joins = matches!(last.kind, SegmentKind::AscDec { .. })
            && last.is_ascent()
            && segment.is_ascent()
            && last.gas == segment.gas
            && last.setpoint == segment.setpoint
            && fabs(last.depth - start_depth) < EPSILON;
        if !joins {
            return segment;
        }

        let index = self.segments.len() - 1;
        self.segments.pop();
        self.run_time -= last.time;
        if let Some(used) = self.gas_usage.get_mut(&last.gas) {
            *used -= last.gas_used;
        }
        self.warnings.retain(|w| match w {
            ProfileWarning::PpO2Exceeded { segment, .. }
            | ProfileWarning::EndExceeded { segment, .. } => *segment != index,
            ProfileWarning::CnsExceeded { .. }
            | ProfileWarning::WaypointDecompressed { .. } => true,
        });
        Segment::asc_dec(
            last.start_depth(),
            segment.depth,
            last.time + segment.time,
            segment.gas,
            segment.setpoint,
        )
    }

    /// Travel to a level and stay there for the leg's time.
    fn level(&mut self, leg: &Segment) -> Result<(), DecoError> {
        let target = leg.depth.max(0.0);
        if target > self.depth + EPSILON {
            self.descend_to(target, leg)?;
        } else if target < self.depth - EPSILON {
            self.decompress_to(target)?;
        }
        self.gas = leg.gas;
        self.setpoint = leg.setpoint;
        if leg.time > 0.0 {
            self.append(Segment::dive(target, leg.time, leg.gas, leg.setpoint))?;
        }
        Ok(())
    }

    fn descend_to(&mut self, target: f64, leg: &Segment) -> Result<(), DecoError> {
        self.gas = leg.gas;
        self.setpoint = leg.setpoint;
        // a new descent starts a new gradient-factor line
        self.model.clear_first_stop();
        let time = (target - self.depth) / self.params.descent_rate;
        self.append(Segment::asc_dec(
            self.depth,
            target,
            time,
            leg.gas,
            leg.setpoint,
        ))
    }

    /// Travel over the leg's own time, unless an ascent that fast would
    /// break the ceiling, in which case the ascent is decompressed instead.
    fn waypoint(&mut self, leg: &Segment) -> Result<(), DecoError> {
        let target = leg.depth.max(0.0);
        if leg.time <= 0.0 {
            return self.level(&Segment::dive(target, 0.0, leg.gas, leg.setpoint));
        }
        if target < self.depth - EPSILON {
            let gas = self.lookup(leg.gas)?;
            let mut probe = self.model.clone();
            probe.asc_dec(self.depth, target, leg.time, &gas, leg.setpoint)?;
            if probe.ceiling(self.params.gf_low, self.params.gf_high) > target + EPSILON {
                #[cfg(feature = "defmt")]
                defmt::debug!("waypoint to {} decompressed", target);
                self.warnings.push(ProfileWarning::WaypointDecompressed {
                    depth: target,
                    time: leg.time,
                });
                self.decompress_to(target)?;
                self.gas = leg.gas;
                self.setpoint = leg.setpoint;
                return Ok(());
            }
        } else if target > self.depth + EPSILON {
            self.model.clear_first_stop();
        }
        self.gas = leg.gas;
        self.setpoint = leg.setpoint;
        let mut segment = *leg;
        segment.kind = SegmentKind::Waypoint {
            start_depth: self.depth,
        };
        segment.depth = target;
        self.append(segment)
    }

    /// Ascend to `target`, holding every stop the ceiling requires on the way.
    fn decompress_to(&mut self, target: f64) -> Result<(), DecoError> {
        let target = target.max(0.0);
        if self.depth <= target + EPSILON {
            return Ok(());
        }
        let params = self.params;
        self.switch_gas(self.depth, false)?;

        // the first stop anchors the gradient-factor line and is always visited
        let mut first_stop = None;
        if self.model.first_stop().is_none() {
            let first = round_to_stop(self.model.raw_ceiling(params.gf_low), &params);
            if first > target + EPSILON {
                let first = first.min(self.depth);
                #[cfg(feature = "defmt")]
                defmt::debug!("first stop at {}", first);
                self.model.set_first_stop(first);
                first_stop = Some(first);
            }
        }

        while self.depth > target + EPSILON {
            let stop = match first_stop.take() {
                Some(first) => first,
                None => round_to_stop(self.model.ceiling(params.gf_low, params.gf_high), &params),
            };
            let stop = stop.max(target).min(self.depth);
            if stop < self.depth - EPSILON {
                self.ascend_to(stop)?;
            }
            if self.depth <= target + EPSILON {
                break;
            }
            let next = self.next_stop(target);
            self.hold_stop(next)?;
            self.ascend_to(next)?;
        }
        Ok(())
    }

    /// Stop depth below the current one, or the surface past the last stop.
    fn next_stop(&self, target: f64) -> f64 {
        let increment = self.params.stop_depth_increment;
        let mut next = ceil(self.depth / increment - EPSILON) * increment - increment;
        if next < self.params.last_stop_depth - EPSILON {
            next = 0.0;
        }
        next.max(target)
    }

    /// Hold at the current depth until the ceiling at the gradient factor of
    /// `next` clears it.
    fn hold_stop(&mut self, next: f64) -> Result<(), DecoError> {
        let params = self.params;
        let stop = self.depth;
        self.switch_gas(stop, true)?;
        let gas = self.lookup(self.gas)?;
        let gf = gf_at_depth(params.gf_low, params.gf_high, next, self.model.first_stop());

        let mut held = 0.0;
        while self.model.raw_ceiling(gf) > next + EPSILON {
            if held >= MAX_STOP_TIME {
                return Err(DecoError::InvalidSolution { depth: stop });
            }
            self.model
                .const_depth(stop, params.stop_time_increment, &gas, self.setpoint)?;
            held += params.stop_time_increment;
        }
        if held > 0.0 {
            #[cfg(feature = "defmt")]
            defmt::debug!("stop at {} for {} min", stop, held);
            self.record(Segment::deco(stop, held, self.gas, self.setpoint), &gas);
        }
        Ok(())
    }

    /// Ascend at `ascent_rate`, halting to switch wherever a better gas
    /// becomes breathable on the way.
    fn ascend_to(&mut self, target: f64) -> Result<(), DecoError> {
        let params = self.params;
        while self.depth > target + EPSILON {
            let halt = self.switch_depth(target).unwrap_or(target);
            let time = (self.depth - halt) / params.ascent_rate;
            self.append(Segment::asc_dec(
                self.depth,
                halt,
                time,
                self.gas,
                self.setpoint,
            ))?;
            if halt > target + EPSILON {
                self.switch_gas(halt, false)?;
            }
        }

        self.model.check_ceiling(self.depth)
    }

    /// Deepest depth between here and `target` where another gas becomes
    /// the best choice, on the stop grid.
    fn switch_depth(&self, target: f64) -> Option<f64> {
        if self.setpoint > 0.0 {
            return None;
        }
        let increment = self.params.stop_depth_increment;
        let mut halt: Option<f64> = None;
        for (id, gas) in self.gases.enabled() {
            if id == self.gas {
                continue;
            }
            let switch = floor(gas.mod_depth() / increment + EPSILON) * increment;
            if switch >= self.depth - EPSILON || switch <= target + EPSILON {
                continue;
            }
            if self.gases.best_for_depth(switch) != Some(id) {
                continue;
            }
            if halt.is_none_or(|h| switch > h) {
                halt = Some(switch);
            }
        }
        halt
    }

    /// Pick the best gas for `depth`. Without a breathable gas this fails
    /// when `required`, otherwise the current gas is kept. Rebreathers stay
    /// on their diluent.
    fn switch_gas(&mut self, depth: f64, required: bool) -> Result<(), DecoError> {
        if self.setpoint > 0.0 {
            return Ok(());
        }
        match self.gases.best_for_depth(depth) {
            Some(id) => {
                if id != self.gas {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("switching to gas {} at {}", id, depth);
                    self.gas = id;
                }
                Ok(())
            }
            None if required => Err(DecoError::NoSuitableGas { depth }),
            None => Ok(()),
        }
    }
}

#[test]
fn test_shallow_dive_has_no_stops() {
    let params = DiveParameters::default();
    let mut gases = GasList::new();
    let air = gases.push(Gas::air(&params));
    let profile = ProfileBuilder::new(params, gases)
        .segment(Segment::dive(12.0, 30.0, air, 0.0))
        .build()
        .unwrap();
    assert_eq!(profile.deco_time(), 0.0);
    assert_eq!(profile.segments().last().unwrap().depth, 0.0);
    assert!(profile.warnings().is_empty());
}

#[test]
fn test_empty_plan() {
    let params = DiveParameters::default();
    let mut gases = GasList::new();
    let air = gases.push(Gas::air(&params));
    let builder = ProfileBuilder::new(params, gases)
        .segment(Segment::dive(30.0, 20.0, air, 0.0).disabled());
    assert_eq!(builder.build(), Err(DecoError::EmptyPlan));
}
