//! Breathing gases and the ordered list of gases known to a plan.

use alloc::vec::Vec;
use core::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use libm::{floor, round};

use crate::{DiveParameters, EPSILON};

/// Fractions below this are rounding noise.
pub const FRACTION_EPSILON: f64 = 1e-4;

/// MOD in metres given to the air substituted for an invalid gas.
const AIR_FALLBACK_MOD: f64 = 66.0;

/// Position of a gas in its [`GasList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GasId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gas {
    f_he: f64,
    f_o2: f64,
    mod_depth: f64,
    volume: f64,
    enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GasLabel {
    Air,
    Oxygen,
    /// O2 percent
    Nitrox(u8),
    /// O2 percent
    Heliox(u8),
    /// O2 and He percent
    Trimix(u8, u8),
}

impl Gas {
    /// Validated gas. Fractions outside [0, 1], fractions summing past 1 or
    /// a MOD beyond what `max_mod_ppo2` allows all yield air instead.
    pub fn new(f_he: f64, f_o2: f64, mod_depth: f64, params: &DiveParameters) -> Self {
        if Self::validate(f_he, f_o2, mod_depth, params) {
            Gas {
                f_he,
                f_o2,
                mod_depth,
                volume: 0.0,
                enabled: true,
            }
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("invalid gas {} / {} @ {}, using air", f_he, f_o2, mod_depth);
            Gas {
                f_he: 0.0,
                f_o2: crate::FO2,
                mod_depth: AIR_FALLBACK_MOD * params.p_conversion / 10.0,
                volume: 0.0,
                enabled: true,
            }
        }
    }

    pub fn validate(f_he: f64, f_o2: f64, mod_depth: f64, params: &DiveParameters) -> bool {
        (0.0..=1.0).contains(&f_he)
            && f_o2 > 0.0
            && f_o2 <= 1.0
            && f_he + f_o2 <= 1.0 + EPSILON
            && mod_depth >= 0.0
            && mod_depth <= mod_from_pp_o2(f_o2, params.max_mod_ppo2, params) + EPSILON
    }

    pub fn air(params: &DiveParameters) -> Self {
        Self::trimix(0.0, crate::FO2, params)
    }

    pub fn nitrox(f_o2: f64, params: &DiveParameters) -> Self {
        Self::trimix(0.0, f_o2, params)
    }

    /// Gas with the deepest whole-unit MOD `max_mod_ppo2` allows.
    pub fn trimix(f_he: f64, f_o2: f64, params: &DiveParameters) -> Self {
        Self::new(f_he, f_o2, max_mod(f_o2, params.max_mod_ppo2, params), params)
    }

    pub fn with_volume(self, volume: f64) -> Self {
        Gas {
            volume: volume.max(0.0),
            ..self
        }
    }

    pub fn f_he(&self) -> f64 {
        self.f_he
    }

    pub fn f_o2(&self) -> f64 {
        self.f_o2
    }

    pub fn f_n2(&self) -> f64 {
        let f_n2 = 1.0 - self.f_he - self.f_o2;
        if f_n2 < FRACTION_EPSILON { 0.0 } else { f_n2 }
    }

    pub fn mod_depth(&self) -> f64 {
        self.mod_depth
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn pp_o2_at(&self, depth: f64, params: &DiveParameters) -> f64 {
        pp_o2_at(self.f_o2, depth, params)
    }

    /// Deeper MOD first; gases that only work shallower sort later.
    pub fn cmp_mod(&self, other: &Gas) -> Ordering {
        other.mod_depth.total_cmp(&self.mod_depth)
    }

    pub fn label(&self) -> GasLabel {
        let o2 = round(self.f_o2 * 100.0) as u8;
        let he = round(self.f_he * 100.0) as u8;
        if self.f_o2 >= 1.0 - FRACTION_EPSILON {
            GasLabel::Oxygen
        } else if he == 0 && o2 == 21 {
            GasLabel::Air
        } else if he == 0 {
            GasLabel::Nitrox(o2)
        } else if self.f_n2() == 0.0 {
            GasLabel::Heliox(o2)
        } else {
            GasLabel::Trimix(o2, he)
        }
    }
}

/// Deepest whole depth unit at which `f_o2` stays within `max_pp_o2`.
pub fn max_mod(f_o2: f64, max_pp_o2: f64, params: &DiveParameters) -> f64 {
    floor(mod_from_pp_o2(f_o2, max_pp_o2, params) + EPSILON)
}

/// Depth at which `f_o2` reaches `pp_o2` bar.
pub fn mod_from_pp_o2(f_o2: f64, pp_o2: f64, params: &DiveParameters) -> f64 {
    if f_o2 <= 0.0 {
        return 0.0;
    }
    (pp_o2 / f_o2 * params.p_conversion - params.p_amb).max(0.0)
}

/// Oxygen partial pressure in bar of `f_o2` breathed at `depth`.
pub fn pp_o2_at(f_o2: f64, depth: f64, params: &DiveParameters) -> f64 {
    (depth.max(0.0) + params.p_amb) * f_o2 / params.p_conversion
}

/// Gases known to a plan, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GasList {
    gases: Vec<Gas>,
}

impl GasList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, gas: Gas) -> GasId {
        self.gases.push(gas);
        GasId(self.gases.len() - 1)
    }

    pub fn get(&self, id: GasId) -> Option<&Gas> {
        self.gases.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.gases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GasId, &Gas)> {
        self.gases.iter().enumerate().map(|(i, gas)| (GasId(i), gas))
    }

    pub fn enabled(&self) -> impl Iterator<Item = (GasId, &Gas)> {
        self.iter().filter(|(_, gas)| gas.is_enabled())
    }

    /// Returns false for an unknown id.
    pub fn set_enabled(&mut self, id: GasId, enabled: bool) -> bool {
        match self.gases.get_mut(id.0) {
            Some(gas) => {
                if enabled {
                    gas.enable();
                } else {
                    gas.disable();
                }
                true
            }
            None => false,
        }
    }

    /// Ids ordered by MOD, deepest first. Equal MODs keep declaration order.
    pub fn sorted_by_mod(&self) -> Vec<GasId> {
        let mut ids: Vec<GasId> = self.iter().map(|(id, _)| id).collect();
        ids.sort_by(|a, b| self.gases[a.0].cmp_mod(&self.gases[b.0]));
        ids
    }

    /// Enabled gas with the shallowest MOD that still reaches `depth`; the
    /// first declared wins a tie.
    pub fn best_for_depth(&self, depth: f64) -> Option<GasId> {
        let mut best: Option<(GasId, f64)> = None;
        for (id, gas) in self.enabled() {
            if gas.mod_depth() + EPSILON < depth {
                continue;
            }
            match best {
                Some((_, best_mod)) if gas.mod_depth() >= best_mod => {}
                _ => best = Some((id, gas.mod_depth())),
            }
        }
        best.map(|(id, _)| id)
    }

    pub fn deepest_mod(&self) -> Option<f64> {
        self.enabled().map(|(_, gas)| gas.mod_depth()).reduce(f64::max)
    }
}

#[test]
fn test_fn2_rounding_clamp() {
    let params = DiveParameters::default();
    let gas = Gas::new(0.5, 0.49995, 0.0, &params);
    assert_eq!(gas.f_n2(), 0.0);
    let gas = Gas::new(0.35, 0.21, 60.0, &params);
    assert!(libm::fabs(gas.f_n2() - 0.44) < 1e-12);
}

#[test]
fn test_labels() {
    let params = DiveParameters::default();
    assert_eq!(Gas::air(&params).label(), GasLabel::Air);
    assert_eq!(Gas::nitrox(0.32, &params).label(), GasLabel::Nitrox(32));
    assert_eq!(Gas::nitrox(1.0, &params).label(), GasLabel::Oxygen);
    assert_eq!(Gas::trimix(0.35, 0.21, &params).label(), GasLabel::Trimix(21, 35));
    assert_eq!(Gas::trimix(0.9, 0.1, &params).label(), GasLabel::Heliox(10));
}
