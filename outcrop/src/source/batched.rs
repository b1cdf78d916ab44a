//! Point-lookup services queried in fixed-size batches.

use super::ElevationSource;
use crate::{
    grid::check_resolution, ElevationSurface, Field, Grid, OutcropError, Region, TerrainSamples,
};
use geo::geometry::Coord;
use log::{debug, warn};

/// A service answering elevation queries for batches of points.
pub trait PointLookup {
    /// Returns one altitude per coordinate in `batch`, in order.
    fn lookup(&self, batch: &[Coord<f64>]) -> Result<Vec<f64>, OutcropError>;
}

impl<F> PointLookup for F
where
    F: Fn(&[Coord<f64>]) -> Result<Vec<f64>, OutcropError>,
{
    fn lookup(&self, batch: &[Coord<f64>]) -> Result<Vec<f64>, OutcropError> {
        self(batch)
    }
}

/// Samples a regular lattice over the requested region through a
/// [PointLookup], `chunk_size` points per request.
///
/// A failed request does not fail the fetch: its points become NaN.
pub struct BatchedLookup<L> {
    lookup: L,
    resolution: usize,
    chunk_size: usize,
}

impl<L: PointLookup> BatchedLookup<L> {
    pub fn new(lookup: L, resolution: usize, chunk_size: usize) -> Result<Self, OutcropError> {
        check_resolution(resolution)?;
        if chunk_size == 0 {
            return Err(OutcropError::invalid("chunk_size", 0.0, "at least 1"));
        }
        Ok(Self {
            lookup,
            resolution,
            chunk_size,
        })
    }
}

impl<L: PointLookup> ElevationSource for BatchedLookup<L> {
    fn fetch(&self, region: &Region) -> Result<TerrainSamples, OutcropError> {
        let now = std::time::Instant::now();
        let grid = Grid::from_region(region, self.resolution)?;
        let coords: Vec<Coord<f64>> = grid.coords().collect();

        let mut altitudes = Vec::with_capacity(coords.len());
        let mut failed = 0;
        for (idx, chunk) in coords.chunks(self.chunk_size).enumerate() {
            match self.lookup.lookup(chunk) {
                Ok(values) if values.len() == chunk.len() => {
                    altitudes.extend(
                        values
                            .into_iter()
                            .map(|z| if z.is_finite() { z } else { f64::NAN }),
                    );
                }
                Ok(values) => {
                    warn!(
                        "chunk {idx}: expected {} altitudes, got {}",
                        chunk.len(),
                        values.len()
                    );
                    failed += 1;
                    altitudes.extend(std::iter::repeat(f64::NAN).take(chunk.len()));
                }
                Err(e) => {
                    warn!("chunk {idx}: {e}");
                    failed += 1;
                    altitudes.extend(std::iter::repeat(f64::NAN).take(chunk.len()));
                }
            }
        }

        debug!(
            "batched lookup; points: {}, chunks: {}, failed: {failed}, exec: {:?}",
            coords.len(),
            coords.len().div_ceil(self.chunk_size),
            now.elapsed()
        );
        let altitudes = Field::new(grid.shape(), altitudes)?;
        Ok(TerrainSamples::Gridded(ElevationSurface::new(
            grid, altitudes,
        )?))
    }
}
