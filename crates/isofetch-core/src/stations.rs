//! Station list loader (CSV).
//!
//! Expected header: `longitude,latitude,name,category,line`; only the two
//! coordinate columns are required. Rows that are too short or whose
//! coordinates are not numbers are skipped with a warning; everything else
//! becomes a `Point`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::point::{Category, Point};

#[derive(Debug, Deserialize)]
struct Row {
    longitude: String,
    latitude: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    line: Option<String>,
}

/// Load stations from a CSV file.
pub fn load_points(path: &Path) -> Result<Vec<Point>> {
    let file = File::open(path).with_context(|| format!("open stations {}", path.display()))?;
    parse_points(file).with_context(|| format!("load stations {}", path.display()))
}

/// Parse stations from any CSV reader.
pub fn parse_points<R: Read>(reader: R) -> Result<Vec<Point>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        bail!("station file is empty");
    }
    for required in ["longitude", "latitude"] {
        if !headers.iter().any(|h| h == required) {
            bail!("missing required column {:?}", required);
        }
    }

    let mut points = Vec::new();
    for (line_no, row) in rdr.deserialize::<Row>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(row = line_no + 2, error = %e, "skipping unreadable station row");
                continue;
            }
        };
        match to_point(row) {
            Some(point) => points.push(point),
            None => tracing::warn!(row = line_no + 2, "skipping station with non-numeric coordinates"),
        }
    }

    if points.is_empty() {
        bail!("no stations with valid coordinates");
    }
    tracing::debug!(count = points.len(), "loaded stations");
    Ok(points)
}

fn to_point(row: Row) -> Option<Point> {
    let longitude = round6(row.longitude.parse().ok()?);
    let latitude = round6(row.latitude.parse().ok()?);

    let category = match row.category.as_deref().map(str::to_lowercase).as_deref() {
        Some("metro") => Category::Metro,
        Some("tram") => Category::Tram,
        Some("monorail") => Category::Monorail,
        _ => Category::infer(row.line.as_deref().unwrap_or("")),
    };

    let mut point = Point::new(longitude, latitude, category);
    if let Some(name) = row.name.filter(|n| !n.is_empty()) {
        point = point.with_name(name.replace('_', " "));
    }
    if let Some(line) = row.line.filter(|l| !l.is_empty()) {
        point = point.with_line(line);
    }
    Some(point)
}

fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}
