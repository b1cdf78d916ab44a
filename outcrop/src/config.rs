use crate::{
    grid::check_resolution, intersect::check_tolerance, GeologicalUnit, Interpolation,
    OutcropError, Region, ThicknessMode,
};
use serde::{Deserialize, Serialize};

/// Sampling points per axis when a configuration doesn't say.
pub const DEFAULT_RESOLUTION: usize = 100;

/// Everything needed to map one unit over one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapperConfig {
    pub unit: GeologicalUnit,

    pub region: Region,

    /// Grid points per axis.
    #[serde(default = "default_resolution")]
    pub resolution: usize,

    /// Slack in meters around the unit's bounding surfaces.
    #[serde(default)]
    pub tolerance: f64,

    /// How terrain is aligned to the grid. Required.
    pub interpolation: Interpolation,

    #[serde(default)]
    pub thickness_mode: ThicknessMode,
}

impl MapperConfig {
    pub fn new(unit: GeologicalUnit, region: Region, interpolation: Interpolation) -> Self {
        Self {
            unit,
            region,
            resolution: DEFAULT_RESOLUTION,
            tolerance: 0.0,
            interpolation,
            thickness_mode: ThicknessMode::default(),
        }
    }

    /// Checks every parameter. The unit validates itself on
    /// construction and deserialization.
    pub fn validate(&self) -> Result<(), OutcropError> {
        self.region.validate()?;
        check_resolution(self.resolution)?;
        check_tolerance(self.tolerance)
    }
}

fn default_resolution() -> usize {
    DEFAULT_RESOLUTION
}
