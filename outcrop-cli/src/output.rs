use anyhow::Error as AnyError;
use outcrop::{Field, Grid, MaskSummary, OutcropMap};
use serde::Serialize;
use std::{fmt::Display, io::Write};

#[derive(Serialize)]
struct JsonField<'a, T> {
    lons: &'a [f64],
    lats: &'a [f64],
    shape: (usize, usize),
    values: &'a [T],
}

impl<'a, T> JsonField<'a, T> {
    fn new(grid: &'a Grid, field: &'a Field<T>) -> Self {
        Self {
            lons: grid.lons(),
            lats: grid.lats(),
            shape: field.shape(),
            values: field.values(),
        }
    }
}

/// NaN is written as `null`.
pub fn surfaces_json<W: Write>(out: W, map: &OutcropMap) -> Result<(), AnyError> {
    #[derive(Serialize)]
    struct JsonSurfaces<'a> {
        lons: &'a [f64],
        lats: &'a [f64],
        shape: (usize, usize),
        degenerate: bool,
        top: &'a [f64],
        base: &'a [f64],
    }

    let surfaces = JsonSurfaces {
        lons: map.grid.lons(),
        lats: map.grid.lats(),
        shape: map.grid.shape(),
        degenerate: map.surfaces.degenerate,
        top: map.surfaces.top.values(),
        base: map.surfaces.base.values(),
    };
    write_json(out, &surfaces)
}

pub fn difference_json<W: Write>(out: W, map: &OutcropMap) -> Result<(), AnyError> {
    write_json(out, &JsonField::new(&map.grid, &map.difference))
}

pub fn trace_json<W: Write>(out: W, map: &OutcropMap) -> Result<(), AnyError> {
    #[derive(Serialize)]
    struct JsonTrace<'a> {
        #[serde(flatten)]
        mask: JsonField<'a, bool>,
        summary: MaskSummary,
    }

    let trace = JsonTrace {
        mask: JsonField::new(&map.grid, &map.mask),
        summary: map.summary,
    };
    write_json(out, &trace)
}

pub fn surfaces_csv<W: Write>(mut out: W, map: &OutcropMap) -> Result<(), AnyError> {
    writeln!(out, "lon,lat,top,base")?;
    for ((coord, top), base) in map
        .grid
        .coords()
        .zip(map.surfaces.top.iter())
        .zip(map.surfaces.base.iter())
    {
        writeln!(out, "{},{},{top},{base}", coord.x, coord.y)?;
    }
    Ok(())
}

pub fn difference_csv<W: Write>(out: W, map: &OutcropMap) -> Result<(), AnyError> {
    field_csv(out, &map.grid, &map.difference)
}

/// Outcrop cells are written as 1, everything else as 0.
pub fn trace_csv<W: Write>(out: W, map: &OutcropMap) -> Result<(), AnyError> {
    field_csv(out, &map.grid, &map.mask.map(|&hit| u8::from(hit)))
}

fn field_csv<W: Write, T: Display>(
    mut out: W,
    grid: &Grid,
    field: &Field<T>,
) -> Result<(), AnyError> {
    writeln!(out, "lon,lat,value")?;
    for (coord, value) in grid.coords().zip(field.iter()) {
        writeln!(out, "{},{},{value}", coord.x, coord.y)?;
    }
    Ok(())
}

fn write_json<W: Write, T: Serialize>(mut out: W, value: &T) -> Result<(), AnyError> {
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{difference_csv, difference_json, surfaces_json, trace_csv, trace_json};
    use geo::geometry::Coord;
    use outcrop::{
        map_outcrop, ElevationSurface, Field, GeologicalUnit, Grid, Interpolation, MapperConfig,
        OutcropMap, Region, TerrainSamples,
    };

    fn map() -> OutcropMap {
        let unit = GeologicalUnit::new(Coord { x: 0.5, y: 0.5 }, 100.0, 0.0, 10.0, 20.0).unwrap();
        let region = Region {
            min_lon: 0.0,
            max_lon: 1.0,
            min_lat: 0.0,
            max_lat: 1.0,
        };
        let mut config = MapperConfig::new(unit, region, Interpolation::Linear);
        config.resolution = 2;
        let grid = Grid::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        let altitudes = Field::new((2, 2), vec![100.0, f64::NAN, 100.0, 500.0]).unwrap();
        let terrain = TerrainSamples::Gridded(ElevationSurface::new(grid, altitudes).unwrap());
        map_outcrop(&config, &terrain).unwrap()
    }

    #[test]
    fn test_surfaces_json() {
        let mut out = Vec::new();
        surfaces_json(&mut out, &map()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["shape"], serde_json::json!([2, 2]));
        assert_eq!(json["degenerate"], false);
        assert_eq!(json["top"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_json_nan_is_null() {
        let mut out = Vec::new();
        difference_json(&mut out, &map()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert!(json["values"][1].is_null());
        assert!(json["values"][0].is_number());
    }

    #[test]
    fn test_trace_json_carries_summary() {
        let mut out = Vec::new();
        trace_json(&mut out, &map()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["values"][1], false);
        assert_eq!(json["summary"]["unknown"], 1);
        assert_eq!(json["lons"], serde_json::json!([0.0, 1.0]));
    }

    #[test]
    fn test_csv_rows() {
        let mut out = Vec::new();
        trace_csv(&mut out, &map()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "lon,lat,value");
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2], "1,0,0");

        let mut out = Vec::new();
        difference_csv(&mut out, &map()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().nth(2).unwrap().ends_with("NaN"));
    }
}
