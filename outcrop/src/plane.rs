//! Top and base altitude surfaces of a planar unit.
//!
//! # Sign convention
//!
//! Dip direction is `strike + 90°` and angles enter as mathematical
//! angles in the (longitude, latitude) frame, counter-clockwise from
//! +longitude. The upward unit normal is
//!
//! ```text
//! nx = sin(dip)·cos(dip_dir)
//! ny = sin(dip)·sin(dip_dir)
//! nz = cos(dip)
//! ```
//!
//! so the strike line `(cos strike, sin strike)` is level and the plane
//! descends along `(cos dip_dir, sin dip_dir)`. Top and base are both
//! derived from this one normal.

use crate::{Field, GeologicalUnit, Grid, OutcropError};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// `|nz|` below which a plane is treated as vertical.
pub const VERTICAL_EPSILON: f64 = 1e-9;

/// How a unit's thickness is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThicknessMode {
    /// Perpendicular to the bedding plane.
    #[default]
    TrueThickness,

    /// Straight down from the top surface.
    Vertical,
}

/// Upward unit normal of a plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    pub nx: f64,
    pub ny: f64,
    pub nz: f64,
}

impl Normal {
    /// Returns the normal of a plane with the given strike and dip.
    pub fn from_strike_dip(strike: f64, dip: f64) -> Self {
        let dip_dir = (strike + 90.0).to_radians();
        let (sin_dip, cos_dip) = dip.to_radians().sin_cos();
        let (sin_dd, cos_dd) = dip_dir.sin_cos();
        let (nx, ny, nz) = (sin_dip * cos_dd, sin_dip * sin_dd, cos_dip);
        let len = (nx * nx + ny * ny + nz * nz).sqrt();
        Self {
            nx: nx / len,
            ny: ny / len,
            nz: nz / len,
        }
    }

    pub fn is_vertical(&self) -> bool {
        self.nz.abs() < VERTICAL_EPSILON
    }
}

/// A unit's bounding surfaces over a grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaneSurfaces {
    pub top: Field<f64>,
    pub base: Field<f64>,

    /// `true` when the plane is vertical; both surfaces are then NaN.
    pub degenerate: bool,
}

impl PlaneSurfaces {
    /// Returns `self`, or an error if the surfaces are degenerate.
    pub fn non_degenerate(&self, unit: &GeologicalUnit) -> Result<&Self, OutcropError> {
        if self.degenerate {
            Err(OutcropError::DegenerateGeometry { dip: unit.dip() })
        } else {
            Ok(self)
        }
    }
}

/// Returns the vertical distance from top to base.
pub fn vertical_offset(unit: &GeologicalUnit, mode: ThicknessMode) -> f64 {
    match mode {
        ThicknessMode::TrueThickness => {
            unit.thickness() / Normal::from_strike_dip(unit.strike(), unit.dip()).nz
        }
        ThicknessMode::Vertical => unit.thickness(),
    }
}

/// Returns `unit`'s top and base altitudes at every point of `grid`.
pub fn compute_surfaces(
    unit: &GeologicalUnit,
    grid: &Grid,
    mode: ThicknessMode,
) -> PlaneSurfaces {
    let shape = grid.shape();
    let normal = Normal::from_strike_dip(unit.strike(), unit.dip());

    if normal.is_vertical() {
        warn!("dip {}° is vertical, surfaces are undefined", unit.dip());
        return PlaneSurfaces {
            top: Field::filled(shape, f64::NAN),
            base: Field::filled(shape, f64::NAN),
            degenerate: true,
        };
    }

    let origin = unit.origin();
    let Normal { nx, ny, nz } = normal;
    let top = Field::from_fn(shape, |idx| {
        let coord = grid.coord(idx);
        (nx * (coord.x - origin.x) + ny * (coord.y - origin.y)) / -nz + unit.z0()
    });

    let offset = vertical_offset(unit, mode);
    let base = top.map(|z| z - offset);

    debug!("plane surfaces; shape: {shape:?}, normal: {normal:?}, offset: {offset}");

    PlaneSurfaces {
        top,
        base,
        degenerate: false,
    }
}
