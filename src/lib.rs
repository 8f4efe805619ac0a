#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod ceiling;
pub mod compartment;
pub mod gas;
pub mod gas_blend;
pub mod m_value;
pub mod model;
pub mod narcosis;
pub mod ndl;
pub mod oxtox;
pub mod pressure;
pub mod profile;
pub mod segment;
pub mod table;
pub mod zhl16c;

pub use compartment::Compartment;
pub use gas::{Gas, GasId, GasLabel, GasList};
pub use gas_blend::GasBlend;
pub use model::{DecompressionModel, ModelState};
pub use oxtox::OxTox;
pub use profile::{Profile, ProfileBuilder, ProfileWarning};
pub use segment::{Segment, SegmentKind};
pub use table::{build_profiles, MultiProfileTable, TableRow};

/// Nitrogen fraction of air, used for surface saturation and narcosis references.
pub const FN2: f64 = 0.79;
/// Oxygen fraction of air.
pub const FO2: f64 = 0.21;

/// Tolerance used when comparing depths and pressures.
pub(crate) const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Units {
    Metric,
    Imperial,
}

/// Planning configuration. Pressures are expressed in depth units of water
/// (msw or fsw), so `depth + p_amb` is the absolute ambient pressure.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiveParameters {
    pub units: Units,
    pub p_conversion: f64,          // pressure units per bar
    pub p_amb: f64,                 // surface pressure, pressure units
    pub p_h2o: f64,                 // alveolar water vapour, pressure units
    pub gf_low: f64,                // 0 < x <= 1
    pub gf_high: f64,               // 0 < x <= 1
    pub max_ppo2: f64,              // bar, warning threshold
    pub max_mod_ppo2: f64,          // bar, largest MOD a gas may declare
    pub ascent_rate: f64,           // depth units per minute
    pub descent_rate: f64,          // depth units per minute
    pub stop_depth_increment: f64,
    pub last_stop_depth: f64,
    pub stop_time_increment: f64,   // minutes
    pub dive_rmv: f64,              // surface volume per minute
    pub deco_rmv: f64,              // surface volume per minute
    pub o2_narcotic: f64,           // 0 <= x <= 1
    pub he_narcotic: f64,           // 0 <= x <= 1
    pub max_end: f64,               // depth units
}

impl DiveParameters {
    pub fn new(gf_high: f64, gf_low: f64) -> Self {
        DiveParameters {
            gf_low,
            gf_high,
            ..Default::default()
        }
    }

    /// Configuration in feet of seawater.
    pub fn imperial() -> Self {
        DiveParameters {
            units: Units::Imperial,
            p_conversion: 33.0,
            p_amb: 33.0,
            p_h2o: 2.069,
            ascent_rate: 30.0,
            descent_rate: 60.0,
            stop_depth_increment: 10.0,
            last_stop_depth: 10.0,
            dive_rmv: 0.7,
            deco_rmv: 0.6,
            max_end: 130.0,
            ..Default::default()
        }
    }

    /// Same configuration with the surface pressure of the given altitude in metres.
    pub fn with_altitude(self, altitude_m: f64) -> Self {
        DiveParameters {
            p_amb: pressure::altitude_pressure(altitude_m, self.p_conversion),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), DecoError> {
        let gf_in_range = |gf: f64| gf > 0.0 && gf <= 1.0;
        let valid = gf_in_range(self.gf_low)
            && gf_in_range(self.gf_high)
            && self.gf_low <= self.gf_high
            && self.p_conversion > 0.0
            && self.p_amb > 0.0
            && self.p_h2o >= 0.0
            && self.p_h2o < self.p_amb
            && self.ascent_rate > 0.0
            && self.descent_rate > 0.0
            && self.stop_depth_increment > 0.0
            && self.last_stop_depth >= 0.0
            && self.stop_time_increment > 0.0
            && self.dive_rmv >= 0.0
            && self.deco_rmv >= 0.0
            && (0.0..=1.0).contains(&self.o2_narcotic)
            && (0.0..=1.0).contains(&self.he_narcotic);
        if valid {
            Ok(())
        } else {
            Err(DecoError::InvalidParameters)
        }
    }
}

impl Default for DiveParameters {
    fn default() -> Self {
        DiveParameters {
            units: Units::Metric,
            p_conversion: 10.0,
            p_amb: 10.0,
            p_h2o: 0.627,
            gf_low: 0.3,
            gf_high: 0.85,
            max_ppo2: 1.6,
            max_mod_ppo2: 1.6,
            ascent_rate: 10.0,
            descent_rate: 20.0,
            stop_depth_increment: 3.0,
            last_stop_depth: 3.0,
            stop_time_increment: 1.0,
            dive_rmv: 20.0,
            deco_rmv: 17.0,
            o2_narcotic: 1.0,
            he_narcotic: 0.0,
            max_end: 40.0,
        }
    }
}

/// Nitrogen load of a compartment saturated with air at the surface.
pub fn default_tissue_load(params: &DiveParameters) -> f64 {
    FN2 * (params.p_amb - params.p_h2o)
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DecoError {
    /// Compartment state or ceiling stopped being finite.
    UnstableModel { depth: f64 },
    /// An ascent ended above a ceiling that had not cleared.
    BurstCeiling { depth: f64, ceiling: f64 },
    /// A stop never cleared.
    InvalidSolution { depth: f64 },
    NoSuitableGas { depth: f64 },
    UnknownGas(GasId),
    EmptyPlan,
    InvalidParameters,
}

impl fmt::Display for DecoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnstableModel { depth } => {
                write!(f, "decompression model became unstable at depth {depth:.1}")
            }
            Self::BurstCeiling { depth, ceiling } => write!(
                f,
                "ascent to {depth:.1} passed an uncleared ceiling at {ceiling:.1}"
            ),
            Self::InvalidSolution { depth } => {
                write!(f, "stop at depth {depth:.1} never cleared")
            }
            Self::NoSuitableGas { depth } => {
                write!(f, "no enabled gas can be breathed at depth {depth:.1}")
            }
            Self::UnknownGas(id) => write!(f, "segment references unknown gas #{}", id.0),
            Self::EmptyPlan => write!(f, "dive plan has no enabled segments"),
            Self::InvalidParameters => write!(f, "dive parameters are out of range"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecoError {}

#[test]
fn test_default_tissue_load() {
    let params = DiveParameters::default();
    let load = default_tissue_load(&params);
    assert!(libm::fabs(load - 0.79 * 9.373) < 1e-9);
}

#[test]
fn test_validate_gradient_factors() {
    assert!(DiveParameters::new(0.85, 0.3).validate().is_ok());
    assert_eq!(
        DiveParameters::new(0.3, 0.85).validate(),
        Err(DecoError::InvalidParameters)
    );
    assert_eq!(
        DiveParameters::new(1.2, 0.3).validate(),
        Err(DecoError::InvalidParameters)
    );
    assert_eq!(
        DiveParameters::new(0.85, 0.0).validate(),
        Err(DecoError::InvalidParameters)
    );
}

#[test]
fn test_altitude_lowers_surface_pressure() {
    let params = DiveParameters::default().with_altitude(2000.0);
    assert!(params.p_amb < 10.0);
    assert!(params.validate().is_ok());
}
