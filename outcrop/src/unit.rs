use crate::OutcropError;
use geo::geometry::Coord;
use serde::{Deserialize, Serialize};

/// A planar slab of rock.
///
/// Angles are in degrees, altitude and thickness in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawUnit", into = "RawUnit")]
pub struct GeologicalUnit {
    /// Reference point on the top surface, (longitude, latitude).
    origin: Coord<f64>,

    /// Altitude of the reference point.
    z0: f64,

    /// In `[0, 360)`.
    strike: f64,

    /// In `[0, 90]`.
    dip: f64,

    /// Measured perpendicular to the plane.
    thickness: f64,
}

impl GeologicalUnit {
    pub fn new(
        origin: Coord<f64>,
        z0: f64,
        strike: f64,
        dip: f64,
        thickness: f64,
    ) -> Result<Self, OutcropError> {
        for (name, value) in [("x0", origin.x), ("y0", origin.y), ("z0", z0)] {
            if !value.is_finite() {
                return Err(OutcropError::invalid(name, value, "a finite value"));
            }
        }
        if !(0.0..360.0).contains(&strike) {
            return Err(OutcropError::invalid("strike", strike, "a value in [0, 360)"));
        }
        if !(0.0..=90.0).contains(&dip) {
            return Err(OutcropError::invalid("dip", dip, "a value in [0, 90]"));
        }
        if !(thickness >= 0.0 && thickness.is_finite()) {
            return Err(OutcropError::invalid(
                "thickness",
                thickness,
                "a finite value >= 0",
            ));
        }
        Ok(Self {
            origin,
            z0,
            strike,
            dip,
            thickness,
        })
    }

    pub fn origin(&self) -> Coord<f64> {
        self.origin
    }

    pub fn z0(&self) -> f64 {
        self.z0
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }

    pub fn dip(&self) -> f64 {
        self.dip
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Returns `strike + 90°`, wrapped into `[0, 360)`.
    pub fn dip_direction(&self) -> f64 {
        (self.strike + 90.0) % 360.0
    }
}

/// Flat, unvalidated form used for (de)serialization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawUnit {
    x0: f64,
    y0: f64,
    z0: f64,
    strike: f64,
    dip: f64,
    thickness: f64,
}

impl TryFrom<RawUnit> for GeologicalUnit {
    type Error = OutcropError;

    fn try_from(raw: RawUnit) -> Result<Self, Self::Error> {
        Self::new(
            Coord {
                x: raw.x0,
                y: raw.y0,
            },
            raw.z0,
            raw.strike,
            raw.dip,
            raw.thickness,
        )
    }
}

impl From<GeologicalUnit> for RawUnit {
    fn from(unit: GeologicalUnit) -> Self {
        Self {
            x0: unit.origin.x,
            y0: unit.origin.y,
            z0: unit.z0,
            strike: unit.strike,
            dip: unit.dip,
            thickness: unit.thickness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, GeologicalUnit, OutcropError};

    const ORIGIN: Coord = Coord {
        x: -4.0768,
        y: 53.0685,
    };

    fn rejected(strike: f64, dip: f64, thickness: f64) -> &'static str {
        match GeologicalUnit::new(ORIGIN, 1085.0, strike, dip, thickness) {
            Err(OutcropError::InvalidParameter { name, .. }) => name,
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_angle_ranges() {
        assert!(GeologicalUnit::new(ORIGIN, 1085.0, 0.0, 0.0, 0.0).is_ok());
        assert!(GeologicalUnit::new(ORIGIN, 1085.0, 359.9, 90.0, 150.0).is_ok());
        assert_eq!(rejected(360.0, 30.0, 150.0), "strike");
        assert_eq!(rejected(-1.0, 30.0, 150.0), "strike");
        assert_eq!(rejected(135.0, 90.5, 150.0), "dip");
        assert_eq!(rejected(135.0, -0.1, 150.0), "dip");
        assert_eq!(rejected(135.0, 30.0, -1.0), "thickness");
        assert_eq!(rejected(f64::NAN, 30.0, 150.0), "strike");
        assert_eq!(rejected(135.0, 30.0, f64::INFINITY), "thickness");
    }

    #[test]
    fn test_dip_direction_wraps() {
        let unit = GeologicalUnit::new(ORIGIN, 0.0, 300.0, 10.0, 0.0).unwrap();
        assert_eq!(unit.dip_direction(), 30.0);
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"x0": -4.0768, "y0": 53.0685, "z0": 1085, "strike": 135, "dip": 30, "thickness": 150}"#;
        let unit: GeologicalUnit = serde_json::from_str(json).unwrap();
        assert_eq!(unit.strike(), 135.0);
        assert_eq!(unit.origin(), ORIGIN);

        let json = r#"{"x0": 0, "y0": 0, "z0": 0, "strike": 400, "dip": 30, "thickness": 150}"#;
        assert!(serde_json::from_str::<GeologicalUnit>(json).is_err());
    }
}
