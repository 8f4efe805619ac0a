#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use libm::{exp, log};

use crate::m_value::{calculate_m_values, tolerated_ambient};
use crate::zhl16c::ZhL16cGf;
use crate::DiveParameters;

/// One ZHL-16C tissue compartment. Loads and `a` coefficients are in the
/// pressure units of the `DiveParameters` it was built with.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Compartment {
    pub pp_n2: f64,
    pub pp_he: f64,
    index: usize,
    k_n2: f64,
    k_he: f64,
    a_n2: f64,
    b_n2: f64,
    a_he: f64,
    b_he: f64,
}

// pt(t) = palv0 + R(t - 1/k) - [palv0 - pt0 - R/k] * e^(-kt)
// pt(t) -> partial pressure of the gas in the tissue at time t
// pt0 -> initial partial pressure of the gas in the tissue at t=0
// palv0 -> initial alveolar partial pressure of the gas in the mix at t=0
// k -> tissue time constant, ln(2) / half-time
// R -> rate of change of the inspired partial pressure (pressure units/min)
// with R = 0 this is the Haldane constant-depth equation
pub fn schreiner(pt0: f64, palv0: f64, rate: f64, k: f64, minutes: f64) -> f64 {
    palv0 + rate * (minutes - 1.0 / k) - (palv0 - pt0 - rate / k) * exp(-k * minutes)
}

impl Compartment {
    /// Compartment `index` (0..16) with no inert gas load.
    pub fn new(index: usize, params: &DiveParameters) -> Self {
        let ln2 = log(2.0);
        Compartment {
            pp_n2: 0.0,
            pp_he: 0.0,
            index,
            k_n2: ln2 / ZhL16cGf::N2_HALF_LIFE[index],
            k_he: ln2 / ZhL16cGf::HE_HALF_LIFE[index],
            a_n2: ZhL16cGf::N2_A[index] * params.p_conversion,
            b_n2: ZhL16cGf::N2_B[index],
            a_he: ZhL16cGf::HE_A[index] * params.p_conversion,
            b_he: ZhL16cGf::HE_B[index],
        }
    }

    /// Compartment number, 1..=16.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Negative loads clamp to zero; non-finite ones are kept so the model can detect them.
    pub fn set_loads(&mut self, pp_he: f64, pp_n2: f64) {
        self.pp_he = if pp_he < 0.0 { 0.0 } else { pp_he };
        self.pp_n2 = if pp_n2 < 0.0 { 0.0 } else { pp_n2 };
    }

    pub fn total_load(&self) -> f64 {
        self.pp_n2 + self.pp_he
    }

    /// Constant inspired pressures for `minutes`.
    pub fn const_depth(&mut self, pp_he_inspired: f64, pp_n2_inspired: f64, minutes: f64) {
        self.asc_dec(pp_he_inspired, pp_n2_inspired, 0.0, 0.0, minutes);
    }

    /// Inspired pressures changing linearly at `rate_he`/`rate_n2` per minute.
    pub fn asc_dec(
        &mut self,
        pp_he_inspired: f64,
        pp_n2_inspired: f64,
        rate_he: f64,
        rate_n2: f64,
        minutes: f64,
    ) {
        if minutes <= 0.0 {
            return;
        }
        let pp_he = schreiner(self.pp_he, pp_he_inspired, rate_he, self.k_he, minutes);
        let pp_n2 = schreiner(self.pp_n2, pp_n2_inspired, rate_n2, self.k_n2, minutes);
        self.set_loads(pp_he, pp_n2);
    }

    /// `a` and `b` weighted by the current He and N2 loads.
    pub fn coefficients(&self) -> (f64, f64) {
        let total = self.total_load();
        if total <= 0.0 {
            return (self.a_n2, self.b_n2);
        }
        let a = (self.a_n2 * self.pp_n2 + self.a_he * self.pp_he) / total;
        let b = (self.b_n2 * self.pp_n2 + self.b_he * self.pp_he) / total;
        (a, b)
    }

    /// Lowest absolute ambient pressure tolerated at gradient factor `gf`.
    pub fn max_amb(&self, gf: f64) -> f64 {
        let (a, b) = self.coefficients();
        tolerated_ambient(self.total_load(), a, b, gf)
    }

    pub fn m_value_at(&self, p_amb: f64) -> f64 {
        let (a, b) = self.coefficients();
        calculate_m_values(p_amb, a, b)
    }

    /// Fraction of the M-value gradient in use at `p_amb`: 0 at ambient
    /// saturation, 1 on the M-value line.
    pub fn gradient_at(&self, p_amb: f64) -> f64 {
        let span = self.m_value_at(p_amb) - p_amb;
        if span <= 0.0 {
            return 0.0;
        }
        (self.total_load() - p_amb) / span
    }

    pub fn is_finite(&self) -> bool {
        self.pp_n2.is_finite() && self.pp_he.is_finite()
    }
}

#[test]
fn test_const_depth_matches_half_time() {
    let params = DiveParameters::default();
    let mut compartment = Compartment::new(0, &params);
    compartment.set_loads(0.0, 10.0);
    // one half-time closes half the gap
    compartment.const_depth(0.0, 30.0, ZhL16cGf::N2_HALF_LIFE[0]);
    assert!(libm::fabs(compartment.pp_n2 - 20.0) < 1e-9);
}

#[test]
fn test_asc_dec_zero_rate_is_const_depth() {
    let params = DiveParameters::default();
    let mut a = Compartment::new(4, &params);
    a.set_loads(3.0, 12.0);
    let mut b = a;
    a.asc_dec(5.0, 20.0, 0.0, 0.0, 7.5);
    b.const_depth(5.0, 20.0, 7.5);
    assert_eq!(a, b);
}
