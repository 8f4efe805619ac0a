use libm::ceil;

use crate::compartment::Compartment;
use crate::{DiveParameters, EPSILON};

const MAX_ITERATIONS: usize = 100;

/// Gradient factor at `depth` on the line from `gf_low` at `first_stop` to
/// `gf_high` at the surface. Without a first stop the line is flat at `gf_high`;
/// below the first stop it holds at `gf_low`.
pub fn gf_at_depth(gf_low: f64, gf_high: f64, depth: f64, first_stop: Option<f64>) -> f64 {
    match first_stop {
        Some(stop) if stop > 0.0 => {
            if depth >= stop {
                gf_low
            } else {
                gf_high + (gf_low - gf_high) * (depth.max(0.0) / stop)
            }
        }
        _ => gf_high,
    }
}

/// Ceiling depth of a single compartment at a fixed gradient factor, clamped to the surface.
#[inline(never)]
pub fn ceiling(compartment: &Compartment, gf: f64, params: &DiveParameters) -> f64 {
    (compartment.max_amb(gf) - params.p_amb).max(0.0)
}

/// Deepest compartment ceiling and the index of the compartment that sets it.
#[inline(never)]
pub fn max_ceiling(compartments: &[Compartment], gf: f64, params: &DiveParameters) -> (f64, usize) {
    let mut max_ceiling = 0.0;
    let mut tissue_index = 0;
    for (i, compartment) in compartments.iter().enumerate() {
        let tentative_max_ceiling = ceiling(compartment, gf, params);
        if tentative_max_ceiling > max_ceiling {
            max_ceiling = tentative_max_ceiling;
            tissue_index = i;
        }
    }
    (max_ceiling, tissue_index)
}

/// Ceiling under a gradient-factor line anchored at `first_stop` (or at the
/// raw `gf_low` ceiling when no stop has been made yet).
///
/// Returns the shallowest depth `d` whose ceiling at `GF(d)` does not exceed
/// `d`. The iteration starts from the `gf_high` ceiling and only moves deeper,
/// so it settles on the smallest fixed point.
pub fn gf_ceiling(
    compartments: &[Compartment],
    gf_low: f64,
    gf_high: f64,
    first_stop: Option<f64>,
    params: &DiveParameters,
) -> f64 {
    let anchor = first_stop.unwrap_or_else(|| max_ceiling(compartments, gf_low, params).0);
    let mut depth = max_ceiling(compartments, gf_high, params).0;
    if anchor <= 0.0 {
        return depth;
    }
    for _ in 0..MAX_ITERATIONS {
        let gf = gf_at_depth(gf_low, gf_high, depth, Some(anchor));
        let next = max_ceiling(compartments, gf, params).0;
        if next <= depth + EPSILON * EPSILON {
            return next.max(depth);
        }
        depth = next;
    }
    depth
}

/// Round a ceiling up to the next stop depth. Anything between the surface
/// and the last stop becomes the last stop.
pub fn round_to_stop(depth: f64, params: &DiveParameters) -> f64 {
    if depth <= EPSILON {
        return 0.0;
    }
    let increment = params.stop_depth_increment;
    let stop = ceil(depth / increment - EPSILON) * increment;
    stop.max(params.last_stop_depth)
}

#[test]
fn test_gf_line_endpoints() {
    assert_eq!(gf_at_depth(0.3, 0.85, 0.0, Some(21.0)), 0.85);
    assert_eq!(gf_at_depth(0.3, 0.85, 21.0, Some(21.0)), 0.3);
    assert_eq!(gf_at_depth(0.3, 0.85, 30.0, Some(21.0)), 0.3);
    assert_eq!(gf_at_depth(0.3, 0.85, 12.0, None), 0.85);
    let mid = gf_at_depth(0.3, 0.85, 10.5, Some(21.0));
    assert!(libm::fabs(mid - 0.575) < 1e-12);
}

#[test]
fn rounding_test() {
    let params = DiveParameters::default();
    assert_eq!(round_to_stop(14.2412, &params), 15.0);
    assert_eq!(round_to_stop(11.12, &params), 12.0);
    assert_eq!(round_to_stop(12.0, &params), 12.0);
    assert_eq!(round_to_stop(0.4, &params), 3.0);
    assert_eq!(round_to_stop(0.0, &params), 0.0);
}
