//! Cylinder filling: gases of known surface volume blended into one cylinder.

use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::gas::{max_mod, Gas};
use crate::DiveParameters;

/// A cylinder of water capacity `volume` rated to `max_pressure`. Each added
/// gas contributes its own surface volume.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GasBlend {
    volume: f64,
    max_pressure: f64,
    gases: Vec<Gas>,
}

impl GasBlend {
    pub fn new(volume: f64, max_pressure: f64) -> Self {
        GasBlend {
            volume: volume.max(0.0),
            max_pressure: max_pressure.max(0.0),
            gases: Vec::new(),
        }
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn max_pressure(&self) -> f64 {
        self.max_pressure
    }

    pub fn gases(&self) -> &[Gas] {
        &self.gases
    }

    pub fn max_volume(&self) -> f64 {
        self.volume * self.max_pressure
    }

    pub fn current_volume(&self) -> f64 {
        self.gases.iter().map(Gas::volume).sum()
    }

    pub fn remaining_volume(&self) -> f64 {
        (self.max_volume() - self.current_volume()).max(0.0)
    }

    /// Pressure the cylinder is filled to.
    pub fn fill_pressure(&self) -> f64 {
        if self.volume <= 0.0 {
            return 0.0;
        }
        self.current_volume() / self.volume
    }

    /// Adds `gas` when it fits in the remaining headroom.
    pub fn add(&mut self, gas: Gas) -> bool {
        if self.current_volume() + gas.volume() > self.max_volume() {
            return false;
        }
        self.gases.push(gas);
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<Gas> {
        if index < self.gases.len() {
            Some(self.gases.remove(index))
        } else {
            None
        }
    }

    /// Rejected when the contents would no longer fit.
    pub fn set_volume(&mut self, volume: f64) -> bool {
        if volume < 0.0 || self.current_volume() > volume * self.max_pressure {
            return false;
        }
        self.volume = volume;
        true
    }

    /// Rejected when the contents would no longer fit.
    pub fn set_max_pressure(&mut self, max_pressure: f64) -> bool {
        if max_pressure < 0.0 || self.current_volume() > self.volume * max_pressure {
            return false;
        }
        self.max_pressure = max_pressure;
        true
    }

    /// Volume-weighted mix of the contents, `None` while empty.
    pub fn mix(&self, params: &DiveParameters) -> Option<Gas> {
        let total = self.current_volume();
        if total <= 0.0 {
            return None;
        }
        let f_o2 = self.gases.iter().map(|g| g.f_o2() * g.volume()).sum::<f64>() / total;
        let f_he = self.gases.iter().map(|g| g.f_he() * g.volume()).sum::<f64>() / total;
        let mod_depth = max_mod(f_o2, params.max_mod_ppo2, params);
        Some(Gas::new(f_he, f_o2, mod_depth, params).with_volume(total))
    }
}

#[test]
fn test_fill_pressure() {
    let params = DiveParameters::default();
    let mut blend = GasBlend::new(12.0, 232.0);
    assert!(blend.add(Gas::air(&params).with_volume(1200.0)));
    assert!(libm::fabs(blend.fill_pressure() - 100.0) < 1e-9);
}
