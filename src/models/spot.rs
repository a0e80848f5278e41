//! Surf spot records returned by the forecast service

use serde::{Deserialize, Serialize};

use super::Forecast;

/// A named surf location with its upcoming forecasts.
///
/// `id` is stable for a session and is the only key used for grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    pub lat: f64,
    pub lon: f64,
    /// Not guaranteed to be sorted
    #[serde(default)]
    pub forecasts: Vec<Forecast>,
}

impl Spot {
    /// The chronologically first forecast, used for summary cards
    #[must_use]
    pub fn headline(&self) -> Option<&Forecast> {
        self.forecasts
            .iter()
            .min_by(|a, b| (a.date, a.time.as_str()).cmp(&(b.date, b.time.as_str())))
    }
}

/// Static description of a spot from `GET /api/spots/{id}`.
///
/// Coordinates may be missing for spots that were never surveyed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotDetails {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl SpotDetails {
    /// "Fistral Beach (Newquay, Cornwall)", or just the name
    #[must_use]
    pub fn title(&self) -> String {
        let place: Vec<&str> = [self.town.as_deref(), self.region.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect();
        if place.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, place.join(", "))
        }
    }
}
