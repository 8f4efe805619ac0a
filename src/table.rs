//! Several profiles of the same plan lined up row by row for comparison.

use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::gas::GasList;
use crate::profile::{Profile, ProfileBuilder};
use crate::segment::Segment;
use crate::{DecoError, DiveParameters};

/// One row of the comparison: depth from the longest profile, then each
/// profile's run time, `None` past the end of a shorter profile.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TableRow {
    pub depth: f64,
    pub run_times: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Copy)]
pub struct MultiProfileTable<'a> {
    profiles: &'a [Profile],
    longest: usize,
}

impl<'a> MultiProfileTable<'a> {
    pub fn new(profiles: &'a [Profile]) -> Self {
        let mut longest = 0;
        for (i, profile) in profiles.iter().enumerate() {
            if profile.segments().len() > profiles[longest].segments().len() {
                longest = i;
            }
        }
        MultiProfileTable { profiles, longest }
    }

    /// Index of the profile with the most segments; the first one wins a tie.
    pub fn longest_profile(&self) -> usize {
        self.longest
    }

    pub fn rows(&self) -> usize {
        self.profiles
            .get(self.longest)
            .map_or(0, |p| p.segments().len())
    }

    pub fn columns(&self) -> usize {
        self.profiles.len()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&'a Segment> {
        self.profiles.get(column)?.segments().get(row)
    }

    pub fn row_depth(&self, row: usize) -> Option<f64> {
        self.cell(row, self.longest).map(|s| s.depth)
    }

    pub fn run_time(&self, row: usize, column: usize) -> Option<f64> {
        self.cell(row, column).map(|s| s.run_time)
    }

    pub fn max_pp_o2(&self) -> f64 {
        self.profiles.iter().map(Profile::max_pp_o2).fold(0.0, f64::max)
    }

    pub fn max_cns(&self) -> f64 {
        self.profiles.iter().map(Profile::max_cns).fold(0.0, f64::max)
    }

    pub fn pp_o2_warning(&self, limit: f64) -> bool {
        self.max_pp_o2() > limit
    }

    /// Any profile past 100 % CNS.
    pub fn cns_warning(&self) -> bool {
        self.max_cns() > 1.0
    }

    pub fn to_rows(&self) -> Vec<TableRow> {
        (0..self.rows())
            .map(|row| TableRow {
                depth: self.row_depth(row).unwrap_or(0.0),
                run_times: (0..self.columns())
                    .map(|column| self.run_time(row, column))
                    .collect(),
            })
            .collect()
    }
}

/// Build the same plan once per configuration, e.g. for several gradient
/// factor pairs. Fails on the first configuration that cannot be resolved.
pub fn build_profiles(
    configurations: &[DiveParameters],
    gases: &GasList,
    plan: &[Segment],
) -> Result<Vec<Profile>, DecoError> {
    configurations
        .iter()
        .map(|params| {
            ProfileBuilder::new(*params, gases.clone())
                .segments(plan.iter().copied())
                .build()
        })
        .collect()
}

#[test]
fn test_empty_table() {
    let table = MultiProfileTable::new(&[]);
    assert_eq!(table.rows(), 0);
    assert_eq!(table.columns(), 0);
    assert_eq!(table.row_depth(0), None);
    assert!(table.to_rows().is_empty());
}
