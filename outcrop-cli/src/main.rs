mod options;
mod output;

use anyhow::{bail, Context, Error as AnyError};
use clap::Parser;
use geo::geometry::Coord;
use log::debug;
use options::{Cli, Command as CliCmd, Format};
use outcrop::{map_outcrop, MapperConfig, OutcropMap, Sample, TerrainSamples, Tiles};
use serde::Deserialize;
use std::{fs::File, io::BufReader, path::Path};

fn main() -> Result<(), AnyError> {
    let Cli {
        config,
        tile_dir,
        tile_mode,
        samples,
        tolerance,
        interpolation,
        format,
        cmd,
    } = Cli::parse();

    env_logger::init();

    let mut config = read_config(&config)?;
    if let Some(tolerance) = tolerance {
        config.tolerance = tolerance;
    }
    if let Some(interpolation) = interpolation {
        config.interpolation = interpolation;
    }
    debug!("{config:?}");

    let map: OutcropMap = match (tile_dir, samples) {
        (Some(tile_dir), _) => {
            let tiles = Tiles::new(tile_dir, tile_mode.into())?;
            map_outcrop(&config, &tiles)?
        }
        (None, Some(samples)) => map_outcrop(&config, &read_samples(&samples)?)?,
        (None, None) => bail!("one of --tile-dir or --samples is required"),
    };

    let stdout = std::io::stdout().lock();
    match (cmd, format) {
        (CliCmd::Surfaces, Format::Json) => output::surfaces_json(stdout, &map),
        (CliCmd::Surfaces, Format::Csv) => output::surfaces_csv(stdout, &map),
        (CliCmd::Difference, Format::Json) => output::difference_json(stdout, &map),
        (CliCmd::Difference, Format::Csv) => output::difference_csv(stdout, &map),
        (CliCmd::Trace, Format::Json) => output::trace_json(stdout, &map),
        (CliCmd::Trace, Format::Csv) => output::trace_csv(stdout, &map),
    }
}

fn read_config(path: &Path) -> Result<MapperConfig, AnyError> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let config = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

fn read_samples(path: &Path) -> Result<TerrainSamples, AnyError> {
    #[derive(Deserialize)]
    struct JsonSample {
        lon: f64,
        lat: f64,
        alt: Option<f64>,
    }

    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let entries: Vec<JsonSample> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    debug!("read {} samples from {}", entries.len(), path.display());
    Ok(TerrainSamples::Scattered(
        entries
            .into_iter()
            .map(|JsonSample { lon, lat, alt }| {
                Sample::new(Coord { x: lon, y: lat }, alt.unwrap_or(f64::NAN))
            })
            .collect(),
    ))
}
