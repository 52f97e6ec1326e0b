//! Station points: coordinates, category tag and display color.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of station categories. Drives the display color of a station's isochrones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Metro,
    Tram,
    Monorail,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Metro => "metro",
            Category::Tram => "tram",
            Category::Monorail => "monorail",
        }
    }

    /// Infer the category from a free-form line/location label.
    ///
    /// "monorail" wins over "tram"; anything else is metro.
    pub fn infer(line: &str) -> Self {
        let line = line.to_lowercase();
        if line.contains("monorail") {
            Category::Monorail
        } else if line.contains("tram") {
            Category::Tram
        } else {
            Category::Metro
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point rejected before any network attempt (NaN or infinite coordinate).
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("invalid coordinates: longitude={longitude}, latitude={latitude}")]
pub struct ValidationError {
    pub longitude: f64,
    pub latitude: f64,
}

/// A named geographic coordinate (a transit station).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Longitude in degrees, expected in [-180, 180].
    pub longitude: f64,
    /// Latitude in degrees, expected in [-90, 90].
    pub latitude: f64,
    /// Display name, if the source had one.
    pub name: Option<String>,
    pub category: Category,
    /// Line or location label (e.g. "Red line", "MGRN"); only used for metro colors.
    pub line: Option<String>,
}

impl Point {
    pub fn new(longitude: f64, latitude: f64, category: Category) -> Self {
        Self {
            longitude,
            latitude,
            name: None,
            category,
            line: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.line = Some(line.into());
        self
    }

    /// Checks that both coordinates are finite numbers.
    ///
    /// Geographic bounds are not checked here: the remote API rejects
    /// out-of-range coordinates with HTTP 400.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.longitude.is_finite() && self.latitude.is_finite() {
            Ok(())
        } else {
            Err(ValidationError {
                longitude: self.longitude,
                latitude: self.latitude,
            })
        }
    }

    /// Name shown in progress and logs; falls back to "Station N" (1-based).
    pub fn display_name(&self, index: usize) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Station {}", index + 1),
        }
    }

    /// CSS hex color used when rendering this station's isochrones.
    pub fn display_color(&self) -> &'static str {
        match self.category {
            Category::Tram => "#FF8C00",
            Category::Monorail => "#0066FF",
            Category::Metro => {
                let line = self.line.as_deref().unwrap_or("").to_lowercase();
                if line.contains("green") || line.contains("mgrn") {
                    "#00AA00"
                } else {
                    "#FF0000"
                }
            }
        }
    }
}
