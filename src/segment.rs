//! Legs of a dive.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::gas::GasId;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SegmentKind {
    /// Constant depth.
    Dive,
    /// Travel at a fixed rate; negative rates ascend.
    AscDec { start_depth: f64, rate: f64 },
    /// Planned travel over a given time.
    Waypoint { start_depth: f64 },
    /// Decompression stop.
    Deco,
    /// Surface interval before a repetitive dive.
    Surface,
}

/// A leg of a dive. `depth` is where the leg ends, `time` its duration and
/// `run_time` the dive clock at its end, all in minutes and depth units.
/// `pp_o2`, `end`, `gas_used` and `ceiling` are filled in by the profile
/// builder when the leg is appended.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    pub kind: SegmentKind,
    pub depth: f64,
    pub time: f64,
    pub run_time: f64,
    pub gas: GasId,
    pub setpoint: f64,
    pub enabled: bool,
    pub pp_o2: f64,
    pub end: f64,
    pub gas_used: f64,
    pub ceiling: f64,
}

impl Segment {
    fn with_kind(kind: SegmentKind, depth: f64, time: f64, gas: GasId, setpoint: f64) -> Self {
        Segment {
            kind,
            depth,
            time,
            run_time: 0.0,
            gas,
            setpoint,
            enabled: true,
            pp_o2: 0.0,
            end: 0.0,
            gas_used: 0.0,
            ceiling: 0.0,
        }
    }

    /// `time` minutes at `depth`. A `setpoint` of zero means open circuit.
    pub fn dive(depth: f64, time: f64, gas: GasId, setpoint: f64) -> Self {
        Self::with_kind(SegmentKind::Dive, depth, time, gas, setpoint)
    }

    /// Travel to `depth` taking `time` minutes. The start depth is resolved
    /// when the builder reaches it.
    /// Travel to `depth` over `time` minutes. An ascent that would break the
    /// ceiling is decompressed instead, and the profile reports
    /// `ProfileWarning::WaypointDecompressed`.
    pub fn waypoint(depth: f64, time: f64, gas: GasId, setpoint: f64) -> Self {
        Self::with_kind(SegmentKind::Waypoint { start_depth: 0.0 }, depth, time, gas, setpoint)
    }

    pub fn surface(time: f64, gas: GasId) -> Self {
        Self::with_kind(SegmentKind::Surface, 0.0, time, gas, 0.0)
    }

    pub(crate) fn asc_dec(start_depth: f64, depth: f64, time: f64, gas: GasId, setpoint: f64) -> Self {
        let rate = if time > 0.0 { (depth - start_depth) / time } else { 0.0 };
        Self::with_kind(SegmentKind::AscDec { start_depth, rate }, depth, time, gas, setpoint)
    }

    pub(crate) fn deco(depth: f64, time: f64, gas: GasId, setpoint: f64) -> Self {
        Self::with_kind(SegmentKind::Deco, depth, time, gas, setpoint)
    }

    pub fn disabled(self) -> Self {
        Segment {
            enabled: false,
            ..self
        }
    }

    pub fn start_depth(&self) -> f64 {
        match self.kind {
            SegmentKind::AscDec { start_depth, .. } | SegmentKind::Waypoint { start_depth } => {
                start_depth
            }
            _ => self.depth,
        }
    }

    pub fn average_depth(&self) -> f64 {
        (self.start_depth() + self.depth) / 2.0
    }

    pub fn is_stop(&self) -> bool {
        matches!(self.kind, SegmentKind::Deco)
    }

    pub fn is_ascent(&self) -> bool {
        self.depth < self.start_depth()
    }
}
