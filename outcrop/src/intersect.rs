//! Plane/terrain intersection fields.
//!
//! NaN never counts as an outcrop, and where the two bounding surfaces
//! are out of order they are swapped cell by cell before masking.

use crate::{Field, OutcropError, PlaneSurfaces};
use log::debug;
use serde::{Deserialize, Serialize};

/// Plane altitude minus terrain altitude, NaN where either is unknown.
pub type DifferenceField = Field<f64>;

/// True where terrain lies between the unit's bounding surfaces.
pub type OutcropMask = Field<bool>;

/// Which intersection product to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntersectionMode {
    Difference,
    Trace,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntersectionResult {
    Difference(DifferenceField),
    Trace(OutcropMask),
}

/// Cell counts of an outcrop computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaskSummary {
    pub outcrop: usize,
    pub covered: usize,
    pub unknown: usize,
}

impl MaskSummary {
    /// Returns counts for `mask`, where `unknown` cells are those with
    /// NaN in any of the inputs.
    pub fn new(
        mask: &OutcropMask,
        top: &Field<f64>,
        base: &Field<f64>,
        terrain: &Field<f64>,
    ) -> Self {
        let unknown = top
            .iter()
            .zip(base.iter())
            .zip(terrain.iter())
            .filter(|((t, b), z)| t.is_nan() || b.is_nan() || z.is_nan())
            .count();
        let outcrop = mask.iter().filter(|&&hit| hit).count();
        Self {
            outcrop,
            covered: mask.values().len() - outcrop - unknown,
            unknown,
        }
    }
}

/// Returns `plane_top - terrain` elementwise.
pub fn difference(
    plane_top: &Field<f64>,
    terrain: &Field<f64>,
) -> Result<DifferenceField, OutcropError> {
    terrain.ensure_shape(plane_top.shape())?;
    let values = plane_top
        .iter()
        .zip(terrain.iter())
        .map(|(top, z)| top - z)
        .collect();
    Field::new(plane_top.shape(), values)
}

/// Returns true where `terrain` lies within `tolerance` meters of the
/// slab between `plane_top` and `plane_base`.
pub fn outcrop_mask(
    plane_top: &Field<f64>,
    plane_base: &Field<f64>,
    terrain: &Field<f64>,
    tolerance: f64,
) -> Result<OutcropMask, OutcropError> {
    check_tolerance(tolerance)?;
    plane_base.ensure_shape(plane_top.shape())?;
    terrain.ensure_shape(plane_top.shape())?;

    let mut swapped = 0_usize;
    let values = plane_top
        .iter()
        .zip(plane_base.iter())
        .zip(terrain.iter())
        .map(|((&top, &base), &z)| {
            if top.is_nan() || base.is_nan() || z.is_nan() {
                return false;
            }
            if top < base {
                swapped += 1;
            }
            let (lo, hi) = (top.min(base), top.max(base));
            z >= lo - tolerance && z <= hi + tolerance
        })
        .collect();

    if swapped > 0 {
        debug!("outcrop mask; normalized {swapped} cells with top below base");
    }
    Field::new(plane_top.shape(), values)
}

/// Dispatches to [difference] or [outcrop_mask].
pub fn intersect(
    mode: IntersectionMode,
    surfaces: &PlaneSurfaces,
    terrain: &Field<f64>,
    tolerance: f64,
) -> Result<IntersectionResult, OutcropError> {
    match mode {
        IntersectionMode::Difference => {
            difference(&surfaces.top, terrain).map(IntersectionResult::Difference)
        }
        IntersectionMode::Trace => outcrop_mask(&surfaces.top, &surfaces.base, terrain, tolerance)
            .map(IntersectionResult::Trace),
    }
}

pub(crate) fn check_tolerance(tolerance: f64) -> Result<(), OutcropError> {
    if tolerance >= 0.0 && tolerance.is_finite() {
        Ok(())
    } else {
        Err(OutcropError::invalid(
            "tolerance",
            tolerance,
            "a finite value >= 0",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        difference, intersect, outcrop_mask, IntersectionMode, IntersectionResult, MaskSummary,
    };
    use crate::{
        compute_surfaces, Field, GeologicalUnit, Grid, OutcropError, PlaneSurfaces,
        ThicknessMode,
    };
    use approx::assert_relative_eq;
    use geo::geometry::Coord;

    fn field(values: &[f64]) -> Field<f64> {
        Field::new((1, values.len()), values.to_vec()).unwrap()
    }

    fn scenario() -> (Grid, PlaneSurfaces) {
        let unit = GeologicalUnit::new(
            Coord {
                x: -4.0768,
                y: 53.0685,
            },
            1085.0,
            135.0,
            30.0,
            150.0,
        )
        .unwrap();
        let grid = Grid::from_bounds(-4.12, -4.03, 53.04, 53.09, 50).unwrap();
        let surfaces = compute_surfaces(&unit, &grid, ThicknessMode::TrueThickness);
        (grid, surfaces)
    }

    #[test]
    fn test_difference_propagates_nan() {
        let top = field(&[10.0, f64::NAN, 3.0]);
        let diff = difference(&top, &field(&[4.0, 1.0, f64::NAN])).unwrap();
        assert_eq!(diff[(0, 0)], 6.0);
        assert!(diff[(0, 1)].is_nan());
        assert!(diff[(0, 2)].is_nan());
    }

    #[test]
    fn test_difference_antisymmetric() {
        let (grid, surfaces) = scenario();
        let terrain = Field::from_fn(grid.shape(), |(row, col)| {
            if (row + col) % 7 == 0 {
                f64::NAN
            } else {
                1000.0 + (row * col) as f64
            }
        });
        let forward = difference(&surfaces.top, &terrain).unwrap();
        let backward = difference(&terrain, &surfaces.top).unwrap();
        for (f, b) in forward.iter().zip(backward.iter()) {
            if f.is_nan() {
                assert!(b.is_nan());
            } else {
                assert_eq!(*f, -*b);
            }
        }
    }

    #[test]
    fn test_shape_mismatch() {
        assert!(matches!(
            difference(&field(&[1.0, 2.0]), &field(&[1.0])),
            Err(OutcropError::ShapeMismatch { .. })
        ));
        assert!(outcrop_mask(&field(&[1.0]), &field(&[1.0, 2.0]), &field(&[1.0]), 0.0).is_err());
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let f = field(&[1.0]);
        assert!(matches!(
            outcrop_mask(&f, &f, &f, -0.1),
            Err(OutcropError::InvalidParameter {
                name: "tolerance",
                ..
            })
        ));
        assert!(outcrop_mask(&f, &f, &f, f64::NAN).is_err());
    }

    #[test]
    fn test_zero_thickness_zero_tolerance() {
        let plane = field(&[100.0, 100.0, 100.0, 100.0]);
        let terrain = field(&[100.0, 100.000_001, 99.999_999, f64::NAN]);
        let mask = outcrop_mask(&plane, &plane, &terrain, 0.0).unwrap();
        assert_eq!(mask.values(), &[true, false, false, false]);
    }

    #[test]
    fn test_mask_monotonic_in_tolerance() {
        let (grid, surfaces) = scenario();
        let terrain = Field::from_fn(grid.shape(), |(row, col)| {
            900.0 + 4.0 * row as f64 + 3.0 * col as f64
        });
        let mut previous = outcrop_mask(&surfaces.top, &surfaces.base, &terrain, 0.0).unwrap();
        for tolerance in [0.5, 1.0, 5.0, 20.0, 100.0] {
            let mask = outcrop_mask(&surfaces.top, &surfaces.base, &terrain, tolerance).unwrap();
            for (was, is) in previous.iter().zip(mask.iter()) {
                assert!(!was || *is);
            }
            previous = mask;
        }
    }

    #[test]
    fn test_all_nan_terrain_is_all_false() {
        let (grid, surfaces) = scenario();
        let terrain = Field::filled(grid.shape(), f64::NAN);
        let mask = outcrop_mask(&surfaces.top, &surfaces.base, &terrain, 1000.0).unwrap();
        assert_eq!(mask.shape(), (50, 50));
        assert!(mask.iter().all(|hit| !hit));
    }

    #[test]
    fn test_nan_plane_is_false() {
        let mask = outcrop_mask(
            &field(&[f64::NAN, 10.0]),
            &field(&[0.0, f64::NAN]),
            &field(&[5.0, 5.0]),
            100.0,
        )
        .unwrap();
        assert_eq!(mask.values(), &[false, false]);
    }

    #[test]
    fn test_swapped_surfaces_normalized() {
        let top = field(&[0.0, 0.0, 0.0]);
        let base = field(&[10.0, 10.0, 10.0]);
        let terrain = field(&[5.0, 11.0, -2.0]);
        let mask = outcrop_mask(&top, &base, &terrain, 1.0).unwrap();
        assert_eq!(mask.values(), &[true, true, false]);
    }

    #[test]
    fn test_flat_terrain_scenario() {
        let (grid, surfaces) = scenario();
        let terrain = Field::filled(grid.shape(), 1085.0);
        let tolerance = 5.0;
        let mask = outcrop_mask(&surfaces.top, &surfaces.base, &terrain, tolerance).unwrap();
        for idx in (0..50).flat_map(|row| (0..50).map(move |col| (row, col))) {
            let (top, base) = (surfaces.top[idx], surfaces.base[idx]);
            let expected = (1085.0 - top).abs() <= tolerance
                || (1085.0 <= top + tolerance && 1085.0 >= base - tolerance);
            assert_eq!(mask[idx], expected);
        }
        // Degrees against meters keep the plane within a meter of z0
        // over this grid, so the whole grid sits inside the slab.
        assert!(mask.iter().all(|&hit| hit));
    }

    #[test]
    fn test_intersect_dispatch_and_summary() {
        let (grid, surfaces) = scenario();
        let mut terrain = Field::filled(grid.shape(), 1085.0).into_values();
        terrain[0] = f64::NAN;
        terrain[1] = 0.0;
        let terrain = Field::new(grid.shape(), terrain).unwrap();

        let IntersectionResult::Trace(mask) =
            intersect(IntersectionMode::Trace, &surfaces, &terrain, 1.0).unwrap()
        else {
            panic!("expected a trace");
        };
        let summary = MaskSummary::new(&mask, &surfaces.top, &surfaces.base, &terrain);
        assert_eq!(summary.unknown, 1);
        assert_eq!(summary.covered, 1);
        assert_eq!(summary.outcrop, 2498);

        let IntersectionResult::Difference(diff) =
            intersect(IntersectionMode::Difference, &surfaces, &terrain, 0.0).unwrap()
        else {
            panic!("expected a difference");
        };
        assert_relative_eq!(diff[(0, 1)], surfaces.top[(0, 1)]);
    }
}
