use nasadem::NasademError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutcropError {
    #[error("invalid {name} {value}, expected {expected}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("invalid grid, {0}")]
    InvalidGrid(&'static str),

    #[error("shape mismatch, expected {expected:?} got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("degenerate geometry, a plane dipping {dip}° has no altitude solution")]
    DegenerateGeometry { dip: f64 },

    #[error("triangulation failed, {0}")]
    Triangulation(String),

    #[error("elevation data acquisition failed, {0}")]
    DataAcquisition(String),

    #[error("no height files in {0}")]
    Path(PathBuf),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Nasadem(#[from] NasademError),
}

impl OutcropError {
    pub(crate) fn invalid(name: &'static str, value: f64, expected: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            expected,
        }
    }
}
