mod linspace;

pub(crate) use linspace::linspace;

use geo::geometry::Coord;

/// Twice the signed area of triangle `abc`; positive when
/// counter-clockwise.
pub(crate) fn orient(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}
