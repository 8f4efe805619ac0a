//! Oxygen exposure bookkeeping: pulmonary OTU and CNS clock.

use core::ops::{Add, AddAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use libm::{exp, log, pow};

/// CNS recovers with this half-time (minutes) at the surface.
pub const CNS_SURFACE_HALF_TIME: f64 = 90.0;

/// NOAA single-exposure limits: (ppO2 bar, minutes).
const CNS_LIMITS: [(f64, f64); 12] = [
    (0.5, 900.0),
    (0.6, 720.0),
    (0.7, 570.0),
    (0.8, 450.0),
    (0.9, 360.0),
    (1.0, 300.0),
    (1.1, 240.0),
    (1.2, 210.0),
    (1.3, 180.0),
    (1.4, 150.0),
    (1.5, 120.0),
    (1.6, 45.0),
];

#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OxTox {
    otu: f64,
    cns: f64,
    max_pp_o2: f64,
}

impl OxTox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn otu(&self) -> f64 {
        self.otu
    }

    /// CNS clock as a fraction, 1.0 being 100 %.
    pub fn cns(&self) -> f64 {
        self.cns
    }

    pub fn max_pp_o2(&self) -> f64 {
        self.max_pp_o2
    }

    /// Breathe `pp_o2` bar for `minutes`.
    pub fn add_o2(&mut self, minutes: f64, pp_o2: f64) {
        if minutes <= 0.0 {
            return;
        }
        self.otu += minutes * otu_per_minute(pp_o2);
        if let Some(limit) = cns_limit(pp_o2) {
            self.cns += minutes / limit;
        }
        self.max_pp_o2 = self.max_pp_o2.max(pp_o2);
    }

    /// Surface recovery. Only the CNS clock decays.
    pub fn remove_o2(&mut self, minutes: f64) {
        if minutes <= 0.0 {
            return;
        }
        self.cns *= exp(-minutes * log(2.0) / CNS_SURFACE_HALF_TIME);
    }

    /// Exposure accumulated since `earlier`.
    pub fn since(&self, earlier: &OxTox) -> OxTox {
        OxTox {
            otu: self.otu - earlier.otu,
            cns: self.cns - earlier.cns,
            max_pp_o2: self.max_pp_o2,
        }
    }
}

impl Add for OxTox {
    type Output = OxTox;

    fn add(self, other: OxTox) -> OxTox {
        OxTox {
            otu: self.otu + other.otu,
            cns: self.cns + other.cns,
            max_pp_o2: self.max_pp_o2.max(other.max_pp_o2),
        }
    }
}

impl AddAssign for OxTox {
    fn add_assign(&mut self, other: OxTox) {
        *self = *self + other;
    }
}

/// OTU dose rate, zero at or below 0.5 bar.
pub fn otu_per_minute(pp_o2: f64) -> f64 {
    if pp_o2 <= 0.5 {
        return 0.0;
    }
    pow((pp_o2 - 0.5) / 0.5, 5.0 / 6.0)
}

/// Allowed single-exposure minutes at `pp_o2`, `None` when there is no CNS loading.
pub fn cns_limit(pp_o2: f64) -> Option<f64> {
    if pp_o2 <= CNS_LIMITS[0].0 {
        return None;
    }
    for pair in CNS_LIMITS.windows(2) {
        let (lo_pp, lo_t) = pair[0];
        let (hi_pp, hi_t) = pair[1];
        if pp_o2 <= hi_pp {
            return Some(lo_t + (pp_o2 - lo_pp) * (hi_t - lo_t) / (hi_pp - lo_pp));
        }
    }
    // past 1.6 bar keep the steepest slope of the table
    let (lo_pp, lo_t) = CNS_LIMITS[CNS_LIMITS.len() - 2];
    let (hi_pp, hi_t) = CNS_LIMITS[CNS_LIMITS.len() - 1];
    let slope = (hi_t - lo_t) / (hi_pp - lo_pp);
    Some((hi_t + (pp_o2 - hi_pp) * slope).max(1.0))
}

#[test]
fn test_cns_breakpoints() {
    assert_eq!(cns_limit(0.4), None);
    assert!(libm::fabs(cns_limit(1.0).unwrap() - 300.0) < 1e-9);
    assert!(libm::fabs(cns_limit(1.6).unwrap() - 45.0) < 1e-9);
    let between = cns_limit(1.25).unwrap();
    assert!(libm::fabs(between - 195.0) < 1e-9);
    assert_eq!(cns_limit(2.5), Some(1.0));
}

#[test]
fn test_otu_rate() {
    assert_eq!(otu_per_minute(0.5), 0.0);
    assert!(libm::fabs(otu_per_minute(1.0) - 1.0) < 1e-12);
}
