//! Location Resolution Module
//!
//! Resolves a usable [`Location`] either from an ambient timezone signal or
//! from free text typed by the user.
//!
//! Ambient resolution falls back from a built-in table of well known zones,
//! to geocoding the city name embedded in the zone id, to a zero-coordinate
//! location carrying that name. It never fails. Manual geocoding reports
//! `NotFound`/`Transport` errors to the caller.

use tracing::{debug, warn};

use crate::Result;
use crate::error::SurfcastError;
use crate::geocode::Geocoder;
use crate::models::Location;

struct KnownZone {
    zone: &'static str,
    lat: f64,
    lon: f64,
    name: &'static str,
}

const KNOWN_ZONES: [KnownZone; 5] = [
    KnownZone {
        zone: "Europe/London",
        lat: 51.5072,
        lon: -0.1276,
        name: "London, UK",
    },
    KnownZone {
        zone: "America/New_York",
        lat: 40.7128,
        lon: -74.0060,
        name: "New York, US",
    },
    KnownZone {
        zone: "America/Los_Angeles",
        lat: 34.0522,
        lon: -118.2437,
        name: "Los Angeles, US",
    },
    KnownZone {
        zone: "Europe/Paris",
        lat: 48.8566,
        lon: 2.3522,
        name: "Paris, FR",
    },
    KnownZone {
        zone: "Asia/Tokyo",
        lat: 35.6895,
        lon: 139.6917,
        name: "Tokyo, JP",
    },
];

/// Pre-known location for a timezone id, if the zone is in the table
#[must_use]
pub fn known_location(timezone_id: &str) -> Option<Location> {
    KNOWN_ZONES
        .iter()
        .find(|z| z.zone == timezone_id)
        .map(|z| Location::new(z.lat, z.lon, z.name))
}

/// Best-guess place name from a zone id: "America/Costa_Rica" -> "Costa Rica"
#[must_use]
pub fn city_from_timezone(timezone_id: &str) -> String {
    timezone_id
        .rsplit('/')
        .next()
        .unwrap_or(timezone_id)
        .replace('_', " ")
}

/// Service for resolving location inputs
pub struct LocationResolver<G> {
    geocoder: G,
}

impl<G: Geocoder> LocationResolver<G> {
    pub fn new(geocoder: G) -> Self {
        Self { geocoder }
    }

    /// Resolve a location from the user's timezone. Always yields a location.
    pub async fn resolve_ambient(&self, timezone_id: &str) -> Location {
        if let Some(location) = known_location(timezone_id) {
            debug!("Timezone {} found in table: {}", timezone_id, location.name);
            return location;
        }

        let city = city_from_timezone(timezone_id);
        debug!("Timezone {} not in table, geocoding '{}'", timezone_id, city);

        match self.geocode(&city).await {
            Ok(location) => location,
            Err(e) => {
                let exhausted = SurfcastError::ResolutionExhausted { name: city.clone() };
                warn!("{} ({}), falling back to 0,0", exhausted, e);
                Location::null_island(city)
            }
        }
    }

    /// Geocode free text to the top-ranked match.
    pub async fn geocode(&self, query: &str) -> Result<Location> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SurfcastError::validation("Location query cannot be empty"));
        }

        let candidates = self.geocoder.search(query).await?;
        let Some(best) = candidates.first() else {
            return Err(SurfcastError::not_found(query));
        };

        let location = best.to_location()?;
        debug!(
            "Resolved '{}' to {} at ({}, {})",
            query, location.name, location.lat, location.lon
        );
        Ok(location)
    }
}
