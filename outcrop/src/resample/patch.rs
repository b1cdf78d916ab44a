//! Per-triangle interpolants.

use super::mesh::{Mesh, BARY_EPSILON};
use geo::geometry::Coord;

/// Returns the barycentric blend of `values`.
///
/// Vertices with negligible weight are skipped, so a NaN vertex only
/// poisons points it actually contributes to.
pub(crate) fn linear(values: [f64; 3], bary: [f64; 3]) -> f64 {
    values
        .iter()
        .zip(bary)
        .filter(|(_, w)| w.abs() > BARY_EPSILON)
        .map(|(z, w)| z * w)
        .sum()
}

/// Returns the cubic Bézier patch value at `bary`.
///
/// Edge control points come from the vertex gradients and the
/// interior one from the edge and vertex means, which makes the patch
/// exact for planar data.
pub(crate) fn cubic(
    corners: [Coord<f64>; 3],
    values: [f64; 3],
    gradients: [Coord<f64>; 3],
    bary: [f64; 3],
) -> f64 {
    let ctrl = |from: usize, to: usize| {
        let d = corners[to] - corners[from];
        values[from] + (gradients[from].x * d.x + gradients[from].y * d.y) / 3.0
    };
    let [z1, z2, z3] = values;
    let (b210, b120) = (ctrl(0, 1), ctrl(1, 0));
    let (b021, b012) = (ctrl(1, 2), ctrl(2, 1));
    let (b102, b201) = (ctrl(2, 0), ctrl(0, 2));
    let edge_mean = (b210 + b120 + b021 + b012 + b102 + b201) / 6.0;
    let vertex_mean = (z1 + z2 + z3) / 3.0;
    let b111 = edge_mean + (edge_mean - vertex_mean) / 2.0;

    let [u, v, w] = bary;
    u.powi(3) * z1
        + v.powi(3) * z2
        + w.powi(3) * z3
        + 3.0 * u * u * v * b210
        + 3.0 * u * v * v * b120
        + 3.0 * v * v * w * b021
        + 3.0 * v * w * w * b012
        + 3.0 * u * w * w * b102
        + 3.0 * u * u * w * b201
        + 6.0 * u * v * w * b111
}

/// Evaluates triangle `tri` of `mesh` at `bary`.
///
/// Cubic evaluation needs finite values and gradients at all three
/// vertices, otherwise the triangle falls back to linear.
pub(crate) fn evaluate(
    mesh: &Mesh,
    tri: usize,
    bary: [f64; 3],
    gradients: Option<&[Option<Coord<f64>>]>,
) -> f64 {
    let ids = mesh.triangles[tri];
    let values = ids.map(|v| mesh.values[v]);

    let contributes_nan = values
        .iter()
        .zip(bary)
        .any(|(z, w)| z.is_nan() && w.abs() > BARY_EPSILON);
    if contributes_nan {
        return f64::NAN;
    }

    if let Some(gradients) = gradients {
        if let [Some(g0), Some(g1), Some(g2)] = ids.map(|v| gradients[v]) {
            if values.iter().all(|z| z.is_finite()) {
                let corners = ids.map(|v| mesh.points[v]);
                return cubic(corners, values, [g0, g1, g2], bary);
            }
        }
    }

    linear(values, bary)
}
