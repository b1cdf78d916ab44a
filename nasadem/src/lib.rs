//! NASADEM evelation (`.hgt`) file format.
//!
//! # References
//!
//! 1. [30-Meter SRTM Tile Downloader](https://dwtkns.com/srtm30m)
//! 1. [Archive Team](http://fileformats.archiveteam.org/index.php?title=HGT&oldid=17250)
//! 1. [SRTM Collection User Guide](https://lpdaac.usgs.gov/documents/179/SRTM_User_Guide_V3.pdf)

mod error;

pub use crate::error::NasademError;
use byteorder::{BigEndian as BE, ReadBytesExt};
use geo::geometry::Coord;
use memmap2::Mmap;
use std::{fs::File, io::BufReader, mem::size_of, path::Path};

/// Base floating point type used for all coordinates.
pub type C = f64;

/// Raw sample value SRTM uses to mark a void (no data).
pub const VOID: i16 = i16::MIN;

const ARCSEC_PER_DEG: C = 3600.0;

pub struct Tile {
    /// Southwest corner of the tile.
    ///
    /// Specificlly, the _center_ of the SW most sample of the tile.
    sw_corner_center: Coord<C>,

    /// Arcseconds per sample.
    resolution: u8,

    /// Number of (columns, rows) in this tile.
    dimensions: (usize, usize),

    /// Elevation samples, north row first.
    samples: SampleStore,
}

enum SampleStore {
    InMem(Box<[i16]>),
    MemMap(Mmap),
}

impl SampleStore {
    fn get_unchecked(&self, index: usize) -> i16 {
        match self {
            Self::InMem(samples) => samples[index],
            Self::MemMap(raw) => {
                let start = index * size_of::<i16>();
                let bytes = &raw.as_ref()[start..start + size_of::<i16>()];
                i16::from_be_bytes([bytes[0], bytes[1]])
            }
        }
    }
}

impl Tile {
    /// Returns a Tile read into memory from the file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NasademError> {
        let (resolution, dimensions @ (cols, rows)) = extract_resolution(&path)?;
        let sw_corner_center = parse_sw_corner(&path)?;

        let mut file = BufReader::new(File::open(path)?);
        let mut samples = Vec::with_capacity(cols * rows);
        for _ in 0..(cols * rows) {
            samples.push(file.read_i16::<BE>()?);
        }

        Ok(Self {
            sw_corner_center,
            resolution,
            dimensions,
            samples: SampleStore::InMem(samples.into_boxed_slice()),
        })
    }

    /// Returns a Tile using the memory-mapped file as storage.
    pub fn memmap<P: AsRef<Path>>(path: P) -> Result<Self, NasademError> {
        let (resolution, dimensions) = extract_resolution(&path)?;
        let sw_corner_center = parse_sw_corner(&path)?;

        let samples = {
            let file = File::open(path)?;
            // The file is only ever read through this map.
            let mmap = unsafe { Mmap::map(&file)? };
            SampleStore::MemMap(mmap)
        };

        Ok(Self {
            sw_corner_center,
            resolution,
            dimensions,
            samples,
        })
    }

    /// Returns the number of samples in this tile.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        let (x, y) = self.dimensions;
        x * y
    }

    /// Returns this tile's resolution in arcseconds per sample.
    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    /// Returns the spacing between adjacent samples in degrees.
    pub fn sample_spacing(&self) -> C {
        C::from(self.resolution) / ARCSEC_PER_DEG
    }

    /// Returns the center of the southwest-most sample.
    pub fn sw_corner(&self) -> Coord<C> {
        self.sw_corner_center
    }

    /// Returns the elevation (meters) nearest to `coord`.
    ///
    /// `None` when `coord` lies outside this tile, `Some(NaN)` when
    /// the sample is a void.
    pub fn get(&self, coord: Coord<C>) -> Option<C> {
        let (idx_x, idx_y) = self.coord_to_xy(coord);
        #[allow(clippy::cast_possible_wrap)]
        if 0 <= idx_x
            && idx_x < self.dimensions.0 as isize
            && 0 <= idx_y
            && idx_y < self.dimensions.1 as isize
        {
            #[allow(clippy::cast_sign_loss)]
            let raw = self.get_xy((idx_x as usize, idx_y as usize));
            Some(elevation(raw))
        } else {
            None
        }
    }
}

/// Private API
impl Tile {
    fn get_xy(&self, (x, y): (usize, usize)) -> i16 {
        self.samples.get_unchecked(self.xy_to_linear_index((x, y)))
    }

    /// Returns the nearest sample index, where (0, 0) is the SW-most
    /// sample.
    fn coord_to_xy(&self, coord: Coord<C>) -> (isize, isize) {
        let c = ARCSEC_PER_DEG / C::from(self.resolution);
        #[allow(clippy::cast_possible_truncation)]
        let x = ((coord.x - self.sw_corner_center.x) * c).round() as isize;
        #[allow(clippy::cast_possible_truncation)]
        let y = ((coord.y - self.sw_corner_center.y) * c).round() as isize;
        (x, y)
    }

    fn xy_to_linear_index(&self, (x, y): (usize, usize)) -> usize {
        self.dimensions.0 * (self.dimensions.1 - y - 1) + x
    }
}

fn elevation(raw: i16) -> C {
    if raw == VOID {
        C::NAN
    } else {
        C::from(raw)
    }
}

fn extract_resolution<P: AsRef<Path>>(path: P) -> Result<(u8, (usize, usize)), NasademError> {
    const RES_1_ARCSECONDS_FILE_LEN: u64 = 3601 * 3601 * size_of::<u16>() as u64;
    const RES_3_ARCSECONDS_FILE_LEN: u64 = 1201 * 1201 * size_of::<u16>() as u64;
    match path.as_ref().metadata().map(|m| m.len())? {
        RES_1_ARCSECONDS_FILE_LEN => Ok((1, (3601, 3601))),
        RES_3_ARCSECONDS_FILE_LEN => Ok((3, (1201, 1201))),
        invalid_len => Err(NasademError::HgtLen(
            invalid_len,
            path.as_ref().to_owned(),
        )),
    }
}

fn parse_sw_corner<P: AsRef<Path>>(path: P) -> Result<Coord<C>, NasademError> {
    let mk_err = || NasademError::HgtName(path.as_ref().to_owned());
    let name = path
        .as_ref()
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .ok_or_else(mk_err)?;
    if name.len() != 7 {
        return Err(mk_err());
    }
    let lat_sign = match &name[0..1] {
        "N" | "n" => 1,
        "S" | "s" => -1,
        _ => return Err(mk_err()),
    };
    let lat = lat_sign * name[1..3].parse::<i16>().map_err(|_| mk_err())?;
    let lon_sign = match &name[3..4] {
        "E" | "e" => 1,
        "W" | "w" => -1,
        _ => return Err(mk_err()),
    };
    let lon = lon_sign * name[4..7].parse::<i16>().map_err(|_| mk_err())?;
    Ok(Coord {
        x: C::from(lon),
        y: C::from(lat),
    })
}

#[cfg(test)]
mod tests {
    use super::{extract_resolution, parse_sw_corner, Coord, NasademError, Tile, VOID};
    use std::{fs, io::Write, path::PathBuf};

    const DIM: usize = 1201;

    /// Raw sample written at (col, row), row 0 being the north edge.
    fn synthetic(col: usize, row: usize) -> i16 {
        if (col, row) == (7, 7) {
            VOID
        } else {
            i16::try_from((col + 2 * row) % 4000).unwrap()
        }
    }

    /// Writes a synthetic 3 arcsecond tile and returns its path.
    fn write_tile(test: &str) -> PathBuf {
        let dir: PathBuf = [
            std::env::temp_dir(),
            PathBuf::from(format!("nasadem-{}-{test}", std::process::id())),
        ]
        .iter()
        .collect();
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("N44W072.hgt");
        let mut raw = Vec::with_capacity(DIM * DIM * 2);
        for row in 0..DIM {
            for col in 0..DIM {
                raw.extend_from_slice(&synthetic(col, row).to_be_bytes());
            }
        }
        fs::File::create(&path).unwrap().write_all(&raw).unwrap();
        path
    }

    #[test]
    fn test_parse_hgt_name() {
        let path = write_tile("parse");
        assert_eq!(parse_sw_corner(&path).unwrap(), Coord { x: -72.0, y: 44.0 });
        assert_eq!(extract_resolution(&path).unwrap(), (3, (1201, 1201)));
        assert!(matches!(
            parse_sw_corner("X44W072.hgt"),
            Err(NasademError::HgtName(_))
        ));
    }

    #[test]
    fn test_invalid_len() {
        let path = write_tile("len").with_file_name("N00E000.hgt");
        std::fs::write(&path, [0_u8; 10]).unwrap();
        assert!(matches!(
            Tile::load(&path),
            Err(NasademError::HgtLen(10, _))
        ));
    }

    #[test]
    fn test_get_matches_file_layout() {
        let path = write_tile("layout");
        let tile = Tile::load(&path).unwrap();
        let mapped = Tile::memmap(&path).unwrap();
        for t in [&tile, &mapped] {
            assert_eq!(t.len(), 1201 * 1201);
            assert_eq!(t.resolution(), 3);
            assert_eq!(t.sw_corner(), Coord { x: -72.0, y: 44.0 });
        }
        let spacing = tile.sample_spacing();
        for (col, row) in [(0, 0), (5, 1200), (1200, 0), (600, 600), (1200, 1200)] {
            let coord = Coord {
                x: -72.0 + col as f64 * spacing,
                y: 45.0 - row as f64 * spacing,
            };
            let expected = f64::from(synthetic(col, row));
            assert_eq!(tile.get(coord), Some(expected));
            assert_eq!(mapped.get(coord), Some(expected));
        }
    }

    #[test]
    fn test_void_is_nan() {
        let path = write_tile("void");
        let tile = Tile::load(&path).unwrap();
        let spacing = tile.sample_spacing();
        let coord = Coord {
            x: -72.0 + 7.0 * spacing,
            y: 45.0 - 7.0 * spacing,
        };
        assert!(tile.get(coord).unwrap().is_nan());
    }

    #[test]
    fn test_out_of_bounds_get_returns_none() {
        let path = write_tile("bounds");
        let tile = Tile::memmap(path).unwrap();
        // Assert coordinate a smidge north of tile returns None.
        assert_eq!(tile.get(Coord { x: -71.5, y: 45.1 }), None);
        // Assert coordinate a smidge east of tile returns None.
        assert_eq!(tile.get(Coord { x: -70.9, y: 44.5 }), None);
        // Assert coordinate a smidge south of tile returns None.
        assert_eq!(tile.get(Coord { x: -71.5, y: 43.9 }), None);
        // Assert coordinate a smidge west of tile returns None.
        assert_eq!(tile.get(Coord { x: -72.1, y: 44.5 }), None);
    }
}
