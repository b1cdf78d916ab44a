//! NASADEM tile directory as an elevation source.

use super::ElevationSource;
use crate::{ElevationSurface, Field, Grid, OutcropError, Region, TerrainSamples};
use dashmap::DashMap;
use geo::geometry::Coord;
use log::{debug, warn};
use nasadem::{NasademError, Tile};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Floating point type used for tile lookup.
type C = f64;

/// Sample spacing assumed when no tile overlaps a request.
const FALLBACK_SPACING: C = 3.0 / 3600.0;

/// Distance in degrees under which a coordinate is on a tile edge.
const EDGE_EPSILON: C = 1e-6;

#[derive(Clone)]
pub struct Tiles {
    /// Directory containing NASADEM HGT tile files.
    tile_dir: PathBuf,

    /// How to load tiles (in-memory or mapped).
    tile_mode: TileMode,

    /// Tiles which have been looked up, `None` for tiles missing from
    /// `tile_dir`.
    tiles: DashMap<Coord<i16>, Option<Arc<Tile>>>,
}

impl Tiles {
    pub fn new(tile_dir: PathBuf, tile_mode: TileMode) -> Result<Self, OutcropError> {
        let mut has_height_files = false;

        // Let's try to fail early be checking that tile_dir has at
        // least one `hgt` file.
        for entry in std::fs::read_dir(&tile_dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(std::ffi::OsStr::to_str);
            if matches!(ext, Some("hgt" | "HGT")) {
                has_height_files = true;
                break;
            }
        }

        if has_height_files {
            Ok(Self {
                tile_dir,
                tile_mode,
                tiles: DashMap::new(),
            })
        } else {
            Err(OutcropError::Path(tile_dir))
        }
    }

    /// Returns the tile containing `coord`, or `None` if that tile is
    /// not on disk.
    ///
    /// `Tiles` will attempt to fetch the tile from disk if it hasn't
    /// looked for it before.
    pub fn get(&self, coord: Coord<C>) -> Result<Option<Arc<Tile>>, OutcropError> {
        self.get_tile(sw_corner(coord))
    }

    /// Returns the elevation at `coord`, NaN for voids and missing
    /// tiles.
    ///
    /// Tile edges are shared, so a coordinate on the east or north edge
    /// of a loaded tile reads from that tile when its own tile is
    /// missing.
    pub fn elevation(&self, coord: Coord<C>) -> Result<C, OutcropError> {
        for sw_corner in edge_corners(coord) {
            if let Some(z) = self.get_tile(sw_corner)?.and_then(|tile| tile.get(coord)) {
                return Ok(z);
            }
        }
        Ok(C::NAN)
    }
}

/// Private API.
impl Tiles {
    fn get_tile(&self, sw_corner: Coord<i16>) -> Result<Option<Arc<Tile>>, OutcropError> {
        self.tiles
            .entry(sw_corner)
            .or_try_insert_with(|| match self.load_tile(sw_corner) {
                Ok(tile) => Ok(Some(Arc::new(tile))),
                Err(OutcropError::Nasadem(NasademError::Io(e)))
                    if e.kind() == ErrorKind::NotFound =>
                {
                    debug!("no tile for {sw_corner:?}, its samples are NaN");
                    Ok(None)
                }
                Err(e) => Err(e),
            })
            .map(|r| r.clone())
    }

    fn load_tile(&self, sw_corner: Coord<i16>) -> Result<Tile, OutcropError> {
        let tile_path = {
            let file_name = file_name(sw_corner);
            let mut tile_path: PathBuf = [&self.tile_dir, Path::new(&file_name)].iter().collect();
            if !tile_path.exists() {
                let file_name = file_name.to_lowercase();
                tile_path = [&self.tile_dir, Path::new(&file_name)].iter().collect();
            }
            tile_path
        };
        debug!("loading {tile_path:?}");
        match self.tile_mode {
            TileMode::InMem => Ok(Tile::load(tile_path)?),
            TileMode::MemMap => Ok(Tile::memmap(tile_path)?),
        }
    }

    /// Returns the sample spacing of the first tile found at the
    /// region's corners or center.
    fn spacing(&self, region: &Region) -> Result<C, OutcropError> {
        let candidates = [
            Coord {
                x: (region.min_lon + region.max_lon) / 2.0,
                y: (region.min_lat + region.max_lat) / 2.0,
            },
            Coord {
                x: region.min_lon,
                y: region.min_lat,
            },
            Coord {
                x: region.max_lon,
                y: region.max_lat,
            },
        ];
        for coord in candidates {
            if let Some(tile) = self.get(coord)? {
                return Ok(tile.sample_spacing());
            }
        }
        warn!("no tiles overlap {region:?}");
        Ok(FALLBACK_SPACING)
    }
}

/// Samples every tile sample center in `region`, padded by one sample
/// on each side so the region is fully covered.
impl ElevationSource for Tiles {
    fn fetch(&self, region: &Region) -> Result<TerrainSamples, OutcropError> {
        region.validate()?;
        let now = std::time::Instant::now();
        let spacing = self.spacing(region)?;
        let lons = sample_axis(region.min_lon, region.max_lon, spacing);
        let lats = sample_axis(region.min_lat, region.max_lat, spacing);
        let grid = Grid::new(lons, lats)?;

        let mut altitudes = Vec::with_capacity(grid.len());
        for coord in grid.coords() {
            altitudes.push(self.elevation(coord)?);
        }
        let altitudes = Field::new(grid.shape(), altitudes)?;

        let missing = altitudes.nan_count();
        if missing > 0 {
            warn!("{missing} of {} tile samples are missing", grid.len());
        }
        debug!(
            "tile fetch; shape: {:?}, spacing: {spacing}, exec: {:?}",
            grid.shape(),
            now.elapsed()
        );
        Ok(TerrainSamples::Gridded(ElevationSurface::new(
            grid, altitudes,
        )?))
    }
}

/// How to handle tile.
///
/// The trade off between loading tile data into memory versus memory
/// mapping is not obvious, and you should measure both before
/// deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMode {
    /// Parse tile and load into memory.
    ///
    /// Note that this can consume gigabytes of RAM when loading many
    /// tiles.
    InMem,

    /// Memory map file contents.
    MemMap,
}

/// Returns sample-aligned positions from just below `min` to just
/// above `max`.
fn sample_axis(min: C, max: C, spacing: C) -> Vec<C> {
    let first = (min / spacing).floor();
    let last = (max / spacing).ceil();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let steps = ((last - first) as usize).max(1);
    #[allow(clippy::cast_precision_loss)]
    (0..=steps)
        .map(|i| (first + i as C) * spacing)
        .collect()
}

/// Returns the southwest corner as integers for coord.
fn sw_corner(Coord { x, y }: Coord<C>) -> Coord<i16> {
    #[allow(clippy::cast_possible_truncation)]
    Coord {
        x: (x.floor() as i16),
        y: (y.floor() as i16),
    }
}

/// Returns the tile corners that may hold `coord`: its own tile first,
/// then the west and south neighbours when `coord` is on their shared
/// edge.
fn edge_corners(coord: Coord<C>) -> Vec<Coord<i16>> {
    let own = sw_corner(coord);
    let on_west_edge = coord.x - coord.x.floor() < EDGE_EPSILON;
    let on_south_edge = coord.y - coord.y.floor() < EDGE_EPSILON;
    let mut corners = vec![own];
    if on_west_edge {
        corners.push(Coord {
            x: own.x.saturating_sub(1),
            y: own.y,
        });
    }
    if on_south_edge {
        corners.push(Coord {
            x: own.x,
            y: own.y.saturating_sub(1),
        });
    }
    if on_west_edge && on_south_edge {
        corners.push(Coord {
            x: own.x.saturating_sub(1),
            y: own.y.saturating_sub(1),
        });
    }
    corners
}

/// Returns the expected file name for coord
fn file_name(Coord { x, y }: Coord<i16>) -> String {
    let (n_s, lat) = {
        let lat = y.abs();
        let n_s = if y.is_negative() { 'S' } else { 'N' };
        (n_s, lat)
    };
    let (e_w, lon) = {
        let lon = x.abs();
        let e_w = if x.is_negative() { 'W' } else { 'E' };
        (e_w, lon)
    };
    format!("{n_s}{lat:02}{e_w}{lon:03}.hgt")
}
