use crate::{
    compute_surfaces, difference, outcrop_mask, resample, DifferenceField, ElevationSource,
    ElevationSurface, Grid, MapperConfig, MaskSummary, OutcropError, OutcropMask, PlaneSurfaces,
};
use log::{debug, info};

/// Every product of one outcrop computation.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcropMap {
    pub grid: Grid,
    pub surfaces: PlaneSurfaces,

    /// Terrain resampled onto `grid`.
    pub terrain: ElevationSurface,

    /// Top surface minus terrain.
    pub difference: DifferenceField,

    pub mask: OutcropMask,
    pub summary: MaskSummary,
}

/// Builds the grid, computes the unit's surfaces, fetches terrain from
/// `source`, aligns it to the grid, and intersects.
///
/// A vertical unit is not an error here: its surfaces, difference and
/// mask come back all-NaN/false with `surfaces.degenerate` set.
pub fn map_outcrop<S>(config: &MapperConfig, source: &S) -> Result<OutcropMap, OutcropError>
where
    S: ElevationSource + ?Sized,
{
    config.validate()?;
    let now = std::time::Instant::now();

    let grid = Grid::from_region(&config.region, config.resolution)?;
    let surfaces = compute_surfaces(&config.unit, &grid, config.thickness_mode);

    let raw = source.fetch(&config.region)?;
    debug!("fetched {} terrain samples in {:?}", raw.len(), now.elapsed());
    let terrain = resample(&raw, &grid, config.interpolation)?;

    let difference = difference(&surfaces.top, terrain.altitudes())?;
    let mask = outcrop_mask(
        &surfaces.top,
        &surfaces.base,
        terrain.altitudes(),
        config.tolerance,
    )?;
    let summary = MaskSummary::new(&mask, &surfaces.top, &surfaces.base, terrain.altitudes());

    info!(
        "outcrop: {}, covered: {}, unknown: {}",
        summary.outcrop, summary.covered, summary.unknown
    );
    debug!("map_outcrop; shape: {:?}, exec: {:?}", grid.shape(), now.elapsed());

    Ok(OutcropMap {
        grid,
        surfaces,
        terrain,
        difference,
        mask,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::map_outcrop;
    use crate::{
        ElevationSurface, Field, GeologicalUnit, Grid, Interpolation, MapperConfig, OutcropError,
        Region, TerrainSamples,
    };
    use approx::assert_relative_eq;
    use geo::geometry::Coord;

    fn config(dip: f64) -> MapperConfig {
        let unit = GeologicalUnit::new(
            Coord {
                x: -4.0768,
                y: 53.0685,
            },
            1085.0,
            135.0,
            dip,
            150.0,
        )
        .unwrap();
        let region = Region {
            min_lon: -4.12,
            max_lon: -4.03,
            min_lat: 53.04,
            max_lat: 53.09,
        };
        let mut config = MapperConfig::new(unit, region, Interpolation::Linear);
        config.resolution = 30;
        config.tolerance = 5.0;
        config
    }

    /// Coarse descending raster of flat terrain at `altitude`, larger
    /// than the configured region.
    fn raster(altitude: f64) -> TerrainSamples {
        let grid = Grid::new(
            vec![-4.2, -4.1, -4.0, -3.9],
            vec![53.2, 53.1, 53.0, 52.9],
        )
        .unwrap();
        let altitudes = Field::filled(grid.shape(), altitude);
        TerrainSamples::Gridded(ElevationSurface::new(grid, altitudes).unwrap())
    }

    #[test]
    fn test_flat_terrain_at_reference_altitude() {
        let map = map_outcrop(&config(30.0), &raster(1085.0)).unwrap();
        assert_eq!(map.grid.shape(), (30, 30));
        assert_eq!(map.summary.outcrop, 900);
        assert_eq!(map.summary.unknown, 0);
        for (d, top) in map.difference.iter().zip(map.surfaces.top.iter()) {
            assert_relative_eq!(*d, top - 1085.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_terrain_far_above_is_covered() {
        let map = map_outcrop(&config(30.0), &raster(3000.0)).unwrap();
        assert_eq!(map.summary.outcrop, 0);
        assert_eq!(map.summary.covered, 900);
    }

    #[test]
    fn test_vertical_unit_is_flagged() {
        let map = map_outcrop(&config(90.0), &raster(1085.0)).unwrap();
        assert!(map.surfaces.degenerate);
        assert_eq!(map.summary.unknown, 900);
        assert!(map.mask.iter().all(|hit| !hit));
    }

    #[test]
    fn test_invalid_config_fails_before_fetch() {
        let mut config = config(30.0);
        config.tolerance = -1.0;
        let err = map_outcrop(&config, &raster(0.0)).unwrap_err();
        assert!(matches!(err, OutcropError::InvalidParameter { .. }));
    }
}
