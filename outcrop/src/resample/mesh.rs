//! Triangle meshes over terrain samples.

use super::Sample;
use crate::{math::orient, ElevationSurface, OutcropError};
use geo::geometry::Coord;
use log::debug;
use spade::{DelaunayTriangulation, HasPosition, Point2, Triangulation};
use std::collections::HashSet;

/// Barycentric weights down to `-BARY_EPSILON` still count as inside.
pub(crate) const BARY_EPSILON: f64 = 1e-9;

pub(crate) struct Mesh {
    pub points: Vec<Coord<f64>>,
    pub values: Vec<f64>,
    /// Vertex indices, counter-clockwise.
    pub triangles: Vec<[usize; 3]>,
    index: TriangleIndex,
}

enum TriangleIndex {
    /// Cell `(row, col)` of an ascending lattice holds triangles
    /// `2 * (row * (cols - 1) + col)` and the one after it.
    Lattice { lons: Vec<f64>, lats: Vec<f64> },

    /// Uniform buckets of triangle ids keyed by bounding box overlap.
    Buckets {
        origin: Coord<f64>,
        cell: Coord<f64>,
        dims: (usize, usize),
        buckets: Vec<Vec<usize>>,
    },
}

impl Mesh {
    /// Returns a mesh over a gridded surface, with any descending
    /// axis flipped to ascending first.
    pub fn from_surface(surface: &ElevationSurface) -> Self {
        let grid = surface.grid();
        let altitudes = surface.altitudes();
        let (rows, cols) = grid.shape();
        let flip_lon = grid.lons()[0] > grid.lons()[1];
        let flip_lat = grid.lats()[0] > grid.lats()[1];
        if flip_lon || flip_lat {
            debug!("normalizing source axes; flip_lon: {flip_lon}, flip_lat: {flip_lat}");
        }

        let ascending = |axis: &[f64], flip: bool| -> Vec<f64> {
            if flip {
                axis.iter().rev().copied().collect()
            } else {
                axis.to_vec()
            }
        };
        let lons = ascending(grid.lons(), flip_lon);
        let lats = ascending(grid.lats(), flip_lat);

        let mut points = Vec::with_capacity(rows * cols);
        let mut values = Vec::with_capacity(rows * cols);
        for (row, &y) in lats.iter().enumerate() {
            let src_row = if flip_lat { rows - 1 - row } else { row };
            for (col, &x) in lons.iter().enumerate() {
                let src_col = if flip_lon { cols - 1 - col } else { col };
                points.push(Coord { x, y });
                values.push(altitudes[(src_row, src_col)]);
            }
        }

        let mut triangles = Vec::with_capacity(2 * (rows - 1) * (cols - 1));
        for row in 0..rows - 1 {
            for col in 0..cols - 1 {
                let sw = row * cols + col;
                let se = sw + 1;
                let ne = se + cols;
                let nw = sw + cols;
                triangles.push([sw, se, ne]);
                triangles.push([sw, ne, nw]);
            }
        }

        Self {
            points,
            values,
            triangles,
            index: TriangleIndex::Lattice { lons, lats },
        }
    }

    /// Returns a Delaunay mesh over scattered samples.
    ///
    /// Exact duplicate coordinates keep their first sample.
    pub fn delaunay(samples: &[Sample]) -> Result<Self, OutcropError> {
        let mut seen = HashSet::with_capacity(samples.len());
        let mut points = Vec::with_capacity(samples.len());
        let mut values = Vec::with_capacity(samples.len());
        for sample in samples {
            let Coord { x, y } = sample.coord;
            if !(x.is_finite() && y.is_finite()) {
                let bad = if x.is_finite() { y } else { x };
                return Err(OutcropError::invalid(
                    "sample coordinate",
                    bad,
                    "a finite lon/lat",
                ));
            }
            if seen.insert((x.to_bits(), y.to_bits())) {
                points.push(sample.coord);
                values.push(sample.altitude);
            }
        }
        if points.len() < samples.len() {
            debug!("dropped {} duplicate samples", samples.len() - points.len());
        }

        let triangles = triangulate(&points)?;
        let index = buckets(&points, &triangles);
        Ok(Self {
            points,
            values,
            triangles,
            index,
        })
    }

    /// Returns the triangle containing `p` and `p`'s barycentric
    /// weights in it.
    pub fn locate(&self, p: Coord<f64>) -> Option<(usize, [f64; 3])> {
        match &self.index {
            TriangleIndex::Lattice { lons, lats } => {
                let col = lattice_cell(lons, p.x)?;
                let row = lattice_cell(lats, p.y)?;
                let first = 2 * (row * (lons.len() - 1) + col);
                (first..first + 2).find_map(|tri| self.inside(tri, p))
            }
            TriangleIndex::Buckets {
                origin,
                cell,
                dims,
                buckets,
            } => {
                let (bx, by) = bucket_of(*origin, *cell, *dims, p)?;
                buckets[by * dims.0 + bx]
                    .iter()
                    .find_map(|&tri| self.inside(tri, p))
            }
        }
    }

    /// Returns each vertex's area-weighted mean gradient over incident
    /// triangles with finite values, if it has any.
    pub fn gradients(&self) -> Vec<Option<Coord<f64>>> {
        let mut sums = vec![(Coord { x: 0.0, y: 0.0 }, 0.0); self.points.len()];
        for tri in &self.triangles {
            let [a, b, c] = *tri;
            let (za, zb, zc) = (self.values[a], self.values[b], self.values[c]);
            if !(za.is_finite() && zb.is_finite() && zc.is_finite()) {
                continue;
            }
            let (pa, pb, pc) = (self.points[a], self.points[b], self.points[c]);
            let area2 = orient(pa, pb, pc);
            let gradient = Coord {
                x: ((zb - za) * (pc.y - pa.y) - (zc - za) * (pb.y - pa.y)) / area2,
                y: ((zc - za) * (pb.x - pa.x) - (zb - za) * (pc.x - pa.x)) / area2,
            };
            let weight = area2.abs();
            for vertex in [a, b, c] {
                let (sum, total) = &mut sums[vertex];
                *sum = *sum + gradient * weight;
                *total += weight;
            }
        }
        sums.into_iter()
            .map(|(sum, total)| (total > 0.0).then(|| sum / total))
            .collect()
    }

    fn inside(&self, tri: usize, p: Coord<f64>) -> Option<(usize, [f64; 3])> {
        let [a, b, c] = self.triangles[tri];
        let bary = barycentric(self.points[a], self.points[b], self.points[c], p);
        bary.iter()
            .all(|&w| w >= -BARY_EPSILON)
            .then_some((tri, bary))
    }
}

/// Returns the weights of `p` relative to counter-clockwise `abc`.
fn barycentric(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>, p: Coord<f64>) -> [f64; 3] {
    let area = orient(a, b, c);
    [
        orient(p, b, c) / area,
        orient(a, p, c) / area,
        orient(a, b, p) / area,
    ]
}

fn lattice_cell(axis: &[f64], v: f64) -> Option<usize> {
    let last = axis.len() - 1;
    if v < axis[0] || v > axis[last] {
        return None;
    }
    let idx = axis.partition_point(|&a| a <= v).saturating_sub(1);
    Some(idx.min(last - 1))
}

fn bucket_of(
    origin: Coord<f64>,
    cell: Coord<f64>,
    (nx, ny): (usize, usize),
    p: Coord<f64>,
) -> Option<(usize, usize)> {
    let fx = (p.x - origin.x) / cell.x;
    let fy = (p.y - origin.y) / cell.y;
    #[allow(clippy::cast_precision_loss)]
    if !(fx >= 0.0 && fy >= 0.0 && fx <= nx as f64 && fy <= ny as f64) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(((fx as usize).min(nx - 1), (fy as usize).min(ny - 1)))
}

fn buckets(points: &[Coord<f64>], triangles: &[[usize; 3]]) -> TriangleIndex {
    let (min, max) = points.iter().fold(
        (
            Coord {
                x: f64::INFINITY,
                y: f64::INFINITY,
            },
            Coord {
                x: f64::NEG_INFINITY,
                y: f64::NEG_INFINITY,
            },
        ),
        |(min, max), p| {
            (
                Coord {
                    x: min.x.min(p.x),
                    y: min.y.min(p.y),
                },
                Coord {
                    x: max.x.max(p.x),
                    y: max.y.max(p.y),
                },
            )
        },
    );

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let side = ((triangles.len() as f64).sqrt().ceil() as usize).max(1);
    let dims = (side, side);
    #[allow(clippy::cast_precision_loss)]
    let cell = Coord {
        x: ((max.x - min.x) / side as f64).max(f64::MIN_POSITIVE),
        y: ((max.y - min.y) / side as f64).max(f64::MIN_POSITIVE),
    };
    let mut buckets = vec![Vec::new(); side * side];

    if !triangles.is_empty() {
        for (id, tri) in triangles.iter().enumerate() {
            let corners = tri.map(|v| points[v]);
            let lo = Coord {
                x: corners.iter().map(|c| c.x).fold(f64::INFINITY, f64::min),
                y: corners.iter().map(|c| c.y).fold(f64::INFINITY, f64::min),
            };
            let hi = Coord {
                x: corners.iter().map(|c| c.x).fold(f64::NEG_INFINITY, f64::max),
                y: corners.iter().map(|c| c.y).fold(f64::NEG_INFINITY, f64::max),
            };
            if let (Some((x0, y0)), Some((x1, y1))) =
                (bucket_of(min, cell, dims, lo), bucket_of(min, cell, dims, hi))
            {
                for by in y0..=y1 {
                    for bx in x0..=x1 {
                        buckets[by * side + bx].push(id);
                    }
                }
            }
        }
    }

    TriangleIndex::Buckets {
        origin: min,
        cell,
        dims,
        buckets,
    }
}

/// Vertex payload carrying the sample index through the triangulation.
struct Vertex {
    position: Point2<f64>,
    index: usize,
}

impl HasPosition for Vertex {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

/// Returns the Delaunay triangles of `points`, counter-clockwise.
///
/// The triangles exactly tile the convex hull. Fewer than three
/// non-collinear points yields no triangles.
fn triangulate(points: &[Coord<f64>]) -> Result<Vec<[usize; 3]>, OutcropError> {
    let vertices = points
        .iter()
        .enumerate()
        .map(|(index, p)| Vertex {
            position: Point2::new(p.x, p.y),
            index,
        })
        .collect();
    let triangulation: DelaunayTriangulation<Vertex> = DelaunayTriangulation::bulk_load(vertices)
        .map_err(|e| OutcropError::Triangulation(format!("{e:?}")))?;
    Ok(triangulation
        .inner_faces()
        .map(|face| face.vertices().map(|v| v.data().index))
        .collect())
}
