//! Align terrain samples to a sampling grid.
//!
//! Sources are triangulated (gridded sources cell by cell, scattered
//! ones by Delaunay) and interpolated per triangle. Target points
//! outside the convex hull of the source are NaN; nothing is
//! extrapolated.

mod mesh;
mod patch;

use crate::{ElevationSurface, Field, Grid, OutcropError};
use geo::{
    algorithm::{ConvexHull, Intersects},
    geometry::{Coord, MultiPoint, Point, Polygon},
};
use log::{debug, warn};
use mesh::Mesh;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Interpolation method used when resampling terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Piecewise-planar over the triangulation.
    Linear,

    /// Cubic triangle patches; smoother, but may overshoot between
    /// sparse samples.
    Cubic,
}

impl FromStr for Interpolation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "cubic" => Ok(Self::Cubic),
            other => Err(format!("unknown interpolation '{other}'")),
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::Cubic => f.write_str("cubic"),
        }
    }
}

/// A single terrain observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub coord: Coord<f64>,

    /// Meters, NaN when unknown.
    pub altitude: f64,
}

impl Sample {
    pub fn new(coord: Coord<f64>, altitude: f64) -> Self {
        Self { coord, altitude }
    }
}

/// Raw terrain as delivered by an elevation source.
#[derive(Debug, Clone, PartialEq)]
pub enum TerrainSamples {
    /// Raster-like samples; axes may run in either direction.
    Gridded(ElevationSurface),

    /// Samples at arbitrary locations.
    Scattered(Vec<Sample>),
}

impl TerrainSamples {
    /// Returns the number of samples.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        match self {
            Self::Gridded(surface) => surface.grid().len(),
            Self::Scattered(samples) => samples.len(),
        }
    }
}

/// Returns `source` interpolated onto `target` with `method`.
pub fn resample(
    source: &TerrainSamples,
    target: &Grid,
    method: Interpolation,
) -> Result<ElevationSurface, OutcropError> {
    let now = std::time::Instant::now();

    let (mesh, hull): (Mesh, Polygon<f64>) = match source {
        TerrainSamples::Gridded(surface) => (
            Mesh::from_surface(surface),
            surface.grid().bounding_rect().to_polygon(),
        ),
        TerrainSamples::Scattered(samples) => {
            let mesh = Mesh::delaunay(samples)?;
            let hull = MultiPoint::from(
                mesh.points.iter().copied().map(Point::from).collect::<Vec<_>>(),
            )
            .convex_hull();
            (mesh, hull)
        }
    };

    if mesh.triangles.is_empty() {
        warn!(
            "{} terrain samples span no area, resampled terrain is all NaN",
            source.len()
        );
        let altitudes = Field::filled(target.shape(), f64::NAN);
        return ElevationSurface::new(target.clone(), altitudes);
    }

    let gradients = match method {
        Interpolation::Linear => None,
        Interpolation::Cubic => Some(mesh.gradients()),
    };

    let mut uncovered = 0_usize;
    let altitudes = Field::from_fn(target.shape(), |idx| {
        let p = target.coord(idx);
        let located = if hull.intersects(&p) {
            mesh.locate(p)
        } else {
            None
        };
        match located {
            Some((tri, bary)) => patch::evaluate(&mesh, tri, bary, gradients.as_deref()),
            None => {
                uncovered += 1;
                f64::NAN
            }
        }
    });

    if uncovered > 0 {
        warn!(
            "{uncovered} of {} target points lie outside terrain coverage",
            target.len()
        );
    }
    debug!(
        "resample; method: {method}, samples: {}, triangles: {}, targets: {}, exec: {:?}",
        source.len(),
        mesh.triangles.len(),
        target.len(),
        now.elapsed()
    );

    ElevationSurface::new(target.clone(), altitudes)
}
