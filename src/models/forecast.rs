//! Surf forecast records, quality ratings and rating filters

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SurfcastError;

/// Surf quality label as published by the forecast service.
///
/// Variants are declared from worst to best so the derived ordering matches
/// severity: `Firing > Solid > Playable > Sketchy > LakeMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Rating {
    LakeMode,
    Sketchy,
    Playable,
    Solid,
    Firing,
}

impl Rating {
    pub const ALL: [Rating; 5] = [
        Rating::LakeMode,
        Rating::Sketchy,
        Rating::Playable,
        Rating::Solid,
        Rating::Firing,
    ];

    /// Wire label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Rating::LakeMode => "Lake Mode",
            Rating::Sketchy => "Sketchy",
            Rating::Playable => "Playable",
            Rating::Solid => "Solid",
            Rating::Firing => "Firing",
        }
    }

    /// Ratings below `Playable` never show up on the timeline.
    #[must_use]
    pub fn is_significant(self) -> bool {
        self >= Rating::Playable
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Rating {
    type Err = SurfcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "lakemode" => Ok(Rating::LakeMode),
            "sketchy" => Ok(Rating::Sketchy),
            "playable" => Ok(Rating::Playable),
            "solid" => Ok(Rating::Solid),
            "firing" => Ok(Rating::Firing),
            _ => Err(SurfcastError::validation(format!(
                "Unknown rating '{s}'. Must be one of: Lake Mode, Sketchy, Playable, Solid, Firing"
            ))),
        }
    }
}

impl TryFrom<String> for Rating {
    type Error = SurfcastError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rating> for &'static str {
    fn from(rating: Rating) -> Self {
        rating.label()
    }
}

/// A single time-stamped surf prediction for a spot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Local calendar date
    pub date: NaiveDate,
    /// Local clock time, e.g. "06:00"
    pub time: String,
    pub rating: Rating,
    /// Swell height in meters
    pub swell_wave_height: f64,
    /// Swell peak period in seconds
    pub swell_wave_peak_period: Option<f64>,
    /// Direction the swell comes from (degrees, 0 = North, clockwise)
    pub swell_wave_direction: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    /// "offshore", "cross-shore", "onshore", "glassy"
    pub wind_type: Option<String>,
    /// "light", "breezy", "strong", "none"
    pub wind_severity: Option<String>,
    #[serde(default)]
    pub explanation: String,
}

impl Forecast {
    /// Swell summary such as "1.20m @ 11.0s"
    #[must_use]
    pub fn format_swell(&self) -> String {
        let period = self
            .swell_wave_peak_period
            .map_or_else(|| "?".to_string(), |p| format!("{p:.1}"));
        format!("{:.2}m @ {period}s", self.swell_wave_height)
    }

    /// Wind summary such as "12 km/h offshore, light"
    #[must_use]
    pub fn format_wind(&self) -> String {
        let speed = self
            .wind_speed_kmh
            .map_or_else(|| "?".to_string(), |s| format!("{s:.0}"));
        let wind_type = self.wind_type.as_deref().unwrap_or("");
        match (&self.wind_severity, wind_type) {
            (Some(severity), kind) if kind != "glassy" => {
                format!("{speed} km/h {kind}, {severity}")
            }
            _ => format!("{speed} km/h {wind_type}").trim_end().to_string(),
        }
    }
}

/// One row of a spot's multi-day forecast as served by the detail endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotForecast {
    /// Local ISO datetime, e.g. "2025-06-01T06:00"
    pub time: String,
    pub swell_wave_height: f64,
    pub swell_wave_direction: Option<f64>,
    pub wind_wave_height_m: Option<f64>,
    pub swell_wave_peak_period: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub wind_type: Option<String>,
    pub wind_severity: Option<String>,
    pub explanation: Option<String>,
    pub rating: Option<String>,
    pub timezone: Option<String>,
}

impl SpotForecast {
    /// Split the ISO datetime into a dated forecast row.
    ///
    /// Rows without a recognizable rating or date are dropped.
    #[must_use]
    pub fn into_forecast(self) -> Option<Forecast> {
        let (date, time) = self.time.split_once('T').unwrap_or((self.time.as_str(), ""));
        let date = match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                debug!("Skipping forecast row with bad time '{}': {}", self.time, e);
                return None;
            }
        };
        let rating = match self.rating.as_deref().map(str::parse::<Rating>) {
            Some(Ok(rating)) => rating,
            _ => {
                debug!("Skipping unrated forecast row at {}", self.time);
                return None;
            }
        };

        Some(Forecast {
            date,
            time: time.to_string(),
            rating,
            swell_wave_height: self.swell_wave_height,
            swell_wave_peak_period: self.swell_wave_peak_period,
            swell_wave_direction: self.swell_wave_direction,
            wind_speed_kmh: self.wind_speed_kmh,
            wind_type: self.wind_type,
            wind_severity: self.wind_severity,
            explanation: self.explanation.unwrap_or_default(),
        })
    }
}

/// The set of ratings a user wants to see.
///
/// An empty filter shows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityFilter {
    ratings: BTreeSet<Rating>,
}

impl QualityFilter {
    /// Filter that lets every rating through
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    #[must_use]
    pub fn contains(&self, rating: Rating) -> bool {
        self.ratings.contains(&rating)
    }

    /// Whether a forecast with this rating passes the filter
    #[must_use]
    pub fn allows(&self, rating: Rating) -> bool {
        self.ratings.is_empty() || self.ratings.contains(&rating)
    }

    /// Add the rating if absent, remove it if present
    pub fn toggle(&mut self, rating: Rating) {
        if !self.ratings.remove(&rating) {
            self.ratings.insert(rating);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Rating> + '_ {
        self.ratings.iter().copied()
    }
}

impl FromIterator<Rating> for QualityFilter {
    fn from_iter<I: IntoIterator<Item = Rating>>(iter: I) -> Self {
        Self {
            ratings: iter.into_iter().collect(),
        }
    }
}
