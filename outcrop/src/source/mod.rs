//! Terrain acquisition.
//!
//! Elevation data is injected through [ElevationSource]; the core
//! never reads files or talks to services itself. Whatever the
//! backend, a sample it could not obtain is NaN.

mod batched;
mod tiles;

pub use self::{
    batched::{BatchedLookup, PointLookup},
    tiles::{TileMode, Tiles},
};
use crate::{grid::Region, resample::TerrainSamples, OutcropError};

/// Something that can supply terrain covering a region.
pub trait ElevationSource {
    /// Returns terrain samples covering `region`, NaN where a sample
    /// is unavailable.
    fn fetch(&self, region: &Region) -> Result<TerrainSamples, OutcropError>;
}

/// Pre-fetched samples, returned as is.
impl ElevationSource for TerrainSamples {
    fn fetch(&self, _region: &Region) -> Result<TerrainSamples, OutcropError> {
        Ok(self.clone())
    }
}
