use clap::{Parser, Subcommand, ValueEnum};
use outcrop::{Interpolation, TileMode};
use std::path::PathBuf;

/// Map where a planar geological unit crops out.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// JSON file with the unit, region and mapping parameters.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Directory containing NASADEM hgt tiles.
    #[arg(
        short,
        long,
        conflicts_with = "samples",
        required_unless_present = "samples"
    )]
    pub tile_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "mem-map")]
    pub tile_mode: CliTileMode,

    /// JSON array of `{"lon", "lat", "alt"}` terrain samples, where a
    /// null "alt" is missing data.
    #[arg(short, long)]
    pub samples: Option<PathBuf>,

    /// Overrides the configured tolerance, in meters.
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Overrides the configured interpolation ("linear" or "cubic").
    #[arg(long)]
    pub interpolation: Option<Interpolation>,

    #[arg(short, long, value_enum, default_value = "json")]
    pub format: Format,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliTileMode {
    MemMap,
    InMem,
}

impl From<CliTileMode> for TileMode {
    fn from(mode: CliTileMode) -> Self {
        match mode {
            CliTileMode::MemMap => TileMode::MemMap,
            CliTileMode::InMem => TileMode::InMem,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Csv,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the unit's top and base altitudes.
    Surfaces,

    /// Print top altitude minus terrain altitude.
    Difference,

    /// Print the outcrop mask.
    Trace,
}
