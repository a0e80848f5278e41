//! Location model for geographic coordinates and metadata

use serde::{Deserialize, Serialize};

use crate::geo;

/// A resolved place the user is searching around.
///
/// Values are never mutated after construction; a new location replaces
/// the old one wholesale.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
    /// Display name, e.g. "Newquay, England, GB"
    pub name: String,
    /// State or region, when known
    #[serde(default)]
    pub region: Option<String>,
    /// Country code (ISO 3166-1 alpha-2, uppercase), when known
    #[serde(default)]
    pub country: Option<String>,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(lat: f64, lon: f64, name: impl Into<String>) -> Self {
        Self {
            lat,
            lon,
            name: name.into(),
            region: None,
            country: None,
        }
    }

    /// Attach region and country metadata
    #[must_use]
    pub fn with_region(mut self, region: Option<String>, country: Option<String>) -> Self {
        self.region = region;
        self.country = country;
        self
    }

    /// Terminal fallback used when nothing better could be resolved
    #[must_use]
    pub fn null_island(name: impl Into<String>) -> Self {
        Self::new(0.0, 0.0, name)
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lon)
    }

    /// Distance in miles to another point
    #[must_use]
    pub fn miles_to(&self, lat: f64, lon: f64) -> f64 {
        geo::distance_miles(self.lat, self.lon, lat, lon)
    }
}
