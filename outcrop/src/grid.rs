//! Sampling grids and the per-point fields computed over them.

use crate::{math::linspace, OutcropError};
use geo::geometry::{Coord, Rect};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Minimum number of samples along either grid axis.
pub const MIN_AXIS_LEN: usize = 2;

/// Geographic bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Region {
    /// Returns an error unless every bound is finite and each minimum
    /// is strictly below its maximum.
    pub fn validate(&self) -> Result<(), OutcropError> {
        for (name, value) in [
            ("min_lon", self.min_lon),
            ("max_lon", self.max_lon),
            ("min_lat", self.min_lat),
            ("max_lat", self.max_lat),
        ] {
            if !value.is_finite() {
                return Err(OutcropError::invalid(name, value, "a finite bound"));
            }
        }
        if self.min_lon >= self.max_lon {
            return Err(OutcropError::invalid(
                "max_lon",
                self.max_lon,
                "a value greater than min_lon",
            ));
        }
        if self.min_lat >= self.max_lat {
            return Err(OutcropError::invalid(
                "max_lat",
                self.max_lat,
                "a value greater than min_lat",
            ));
        }
        Ok(())
    }

    pub fn rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_lon,
                y: self.min_lat,
            },
            Coord {
                x: self.max_lon,
                y: self.max_lat,
            },
        )
    }
}

/// A rectangular lon × lat sampling grid.
///
/// Points are ordered row-major with rows following latitude and
/// columns following longitude, so the grid's shape is `(lats, lons)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    lons: Box<[f64]>,
    lats: Box<[f64]>,
}

impl Grid {
    /// Returns a grid over the given axes.
    ///
    /// Each axis needs at least two finite, strictly monotonic values.
    /// Either direction is accepted.
    pub fn new(lons: Vec<f64>, lats: Vec<f64>) -> Result<Self, OutcropError> {
        check_axis(&lons)?;
        check_axis(&lats)?;
        Ok(Self {
            lons: lons.into_boxed_slice(),
            lats: lats.into_boxed_slice(),
        })
    }

    /// Returns an ascending grid with `resolution` points per axis
    /// spanning the bounds inclusively.
    pub fn from_bounds(
        min_lon: f64,
        max_lon: f64,
        min_lat: f64,
        max_lat: f64,
        resolution: usize,
    ) -> Result<Self, OutcropError> {
        Self::from_region(
            &Region {
                min_lon,
                max_lon,
                min_lat,
                max_lat,
            },
            resolution,
        )
    }

    pub fn from_region(region: &Region, resolution: usize) -> Result<Self, OutcropError> {
        check_resolution(resolution)?;
        region.validate()?;
        Self::new(
            linspace(region.min_lon, region.max_lon, resolution).collect(),
            linspace(region.min_lat, region.max_lat, resolution).collect(),
        )
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Returns `(rows, cols)`, i.e. `(lats, lons)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.lats.len(), self.lons.len())
    }

    /// Returns the number of points in this grid.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.lats.len() * self.lons.len()
    }

    /// Returns the coordinate at `(row, col)`.
    pub fn coord(&self, (row, col): (usize, usize)) -> Coord<f64> {
        Coord {
            x: self.lons[col],
            y: self.lats[row],
        }
    }

    /// Returns an iterator over every grid point, row-major.
    pub fn coords(&self) -> impl Iterator<Item = Coord<f64>> + '_ {
        self.lats
            .iter()
            .flat_map(move |&y| self.lons.iter().map(move |&x| Coord { x, y }))
    }

    /// Returns the smallest rectangle containing every grid point.
    pub fn bounding_rect(&self) -> Rect<f64> {
        let (lon_a, lon_b) = (self.lons[0], self.lons[self.lons.len() - 1]);
        let (lat_a, lat_b) = (self.lats[0], self.lats[self.lats.len() - 1]);
        Rect::new(Coord { x: lon_a, y: lat_a }, Coord { x: lon_b, y: lat_b })
    }
}

pub(crate) fn check_resolution(resolution: usize) -> Result<(), OutcropError> {
    if resolution < MIN_AXIS_LEN {
        #[allow(clippy::cast_precision_loss)]
        return Err(OutcropError::invalid(
            "resolution",
            resolution as f64,
            "at least 2 points per axis",
        ));
    }
    Ok(())
}

fn check_axis(axis: &[f64]) -> Result<(), OutcropError> {
    if axis.len() < MIN_AXIS_LEN {
        return Err(OutcropError::InvalidGrid("axis needs at least 2 values"));
    }
    if axis.iter().any(|v| !v.is_finite()) {
        return Err(OutcropError::InvalidGrid("axis values must be finite"));
    }
    let ascending = axis.windows(2).all(|w| w[0] < w[1]);
    let descending = axis.windows(2).all(|w| w[0] > w[1]);
    if !(ascending || descending) {
        return Err(OutcropError::InvalidGrid("axis must be strictly monotonic"));
    }
    Ok(())
}

/// A row-major array of per-point values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field<T> {
    shape: (usize, usize),
    values: Vec<T>,
}

impl<T> Field<T> {
    /// Returns a field of `shape` holding `values` row-major.
    pub fn new(shape: (usize, usize), values: Vec<T>) -> Result<Self, OutcropError> {
        if values.len() == shape.0 * shape.1 {
            Ok(Self { shape, values })
        } else {
            Err(OutcropError::ShapeMismatch {
                expected: shape,
                actual: (values.len(), 1),
            })
        }
    }

    /// Returns a field whose value at `(row, col)` is `f((row, col))`.
    pub fn from_fn<F>(shape: (usize, usize), mut f: F) -> Self
    where
        F: FnMut((usize, usize)) -> T,
    {
        let (rows, cols) = shape;
        let mut values = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                values.push(f((row, col)));
            }
        }
        Self { shape, values }
    }

    /// Returns `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    pub fn get(&self, (row, col): (usize, usize)) -> Option<&T> {
        if row < self.shape.0 && col < self.shape.1 {
            self.values.get(row * self.shape.1 + col)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.values.iter()
    }

    pub fn map<U, F>(&self, f: F) -> Field<U>
    where
        F: FnMut(&T) -> U,
    {
        Field {
            shape: self.shape,
            values: self.values.iter().map(f).collect(),
        }
    }

    pub(crate) fn ensure_shape(&self, expected: (usize, usize)) -> Result<(), OutcropError> {
        if self.shape == expected {
            Ok(())
        } else {
            Err(OutcropError::ShapeMismatch {
                expected,
                actual: self.shape,
            })
        }
    }
}

impl Field<f64> {
    /// Returns a field of `shape` with every value set to `value`.
    pub fn filled(shape: (usize, usize), value: f64) -> Self {
        Self {
            shape,
            values: vec![value; shape.0 * shape.1],
        }
    }

    /// Returns the number of NaN values.
    pub fn nan_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }
}

impl<T> Index<(usize, usize)> for Field<T> {
    type Output = T;

    /// Index by (row, col).
    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        assert!(col < self.shape.1, "column {col} out of bounds");
        &self.values[row * self.shape.1 + col]
    }
}

/// Terrain altitudes aligned 1:1 with a grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElevationSurface {
    grid: Grid,
    altitudes: Field<f64>,
}

impl ElevationSurface {
    /// Returns a surface of `altitudes` (row-major, NaN for missing)
    /// over `grid`.
    pub fn new(grid: Grid, altitudes: Field<f64>) -> Result<Self, OutcropError> {
        altitudes.ensure_shape(grid.shape())?;
        Ok(Self { grid, altitudes })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn altitudes(&self) -> &Field<f64> {
        &self.altitudes
    }
}
