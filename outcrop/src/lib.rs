//! Where a planar geological unit meets the ground.
//!
//! A [GeologicalUnit] is a slab bounded by two parallel planes. Given a
//! sampling [Grid], [compute_surfaces] evaluates both planes, terrain
//! from an [ElevationSource] is aligned to the grid with [resample()], and
//! [difference] and [outcrop_mask] compare the two. [map_outcrop] runs
//! the whole sequence from a [MapperConfig].

mod config;
mod error;
mod grid;
pub mod intersect;
mod math;
mod pipeline;
pub mod plane;
pub mod resample;
mod source;
mod unit;

pub use crate::{
    config::{MapperConfig, DEFAULT_RESOLUTION},
    error::OutcropError,
    grid::{ElevationSurface, Field, Grid, Region, MIN_AXIS_LEN},
    intersect::{
        difference, intersect, outcrop_mask, DifferenceField, IntersectionMode,
        IntersectionResult, MaskSummary, OutcropMask,
    },
    pipeline::{map_outcrop, OutcropMap},
    plane::{compute_surfaces, vertical_offset, Normal, PlaneSurfaces, ThicknessMode},
    resample::{resample, Interpolation, Sample, TerrainSamples},
    source::{BatchedLookup, ElevationSource, PointLookup, TileMode, Tiles},
    unit::GeologicalUnit,
};
pub use geo;
