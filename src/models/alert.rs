//! Surf alert subscriptions

use serde::{Deserialize, Serialize};

use super::{Location, QualityFilter, Rating};
use crate::error::SurfcastError;

pub const KM_PER_MILE: f64 = 1.60934;

/// Body of `POST /api/alerts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRequest {
    pub email: String,
    /// Leading part of the location name
    pub town: String,
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
    pub quality_levels: Vec<Rating>,
    /// Empty when unknown
    pub region: String,
    /// Empty when unknown
    pub country: String,
}

/// Server acknowledgement. `alert_uuid` is opaque and only handed back to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertReceipt {
    pub alert_uuid: String,
}

impl AlertRequest {
    /// Build an alert for `location`.
    ///
    /// Unlike the listing views, an empty quality filter is rejected here:
    /// an alert has to name at least one rating to watch for.
    pub fn new(
        email: &str,
        location: &Location,
        radius_miles: f64,
        quality: &QualityFilter,
    ) -> Result<Self, SurfcastError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(SurfcastError::validation(format!(
                "'{email}' is not a valid email address"
            )));
        }
        if quality.is_empty() {
            return Err(SurfcastError::validation(
                "Select at least one quality level for the alert",
            ));
        }
        if !(radius_miles.is_finite() && radius_miles > 0.0) {
            return Err(SurfcastError::validation(
                "Alert radius must be a positive number of miles",
            ));
        }

        let town = location
            .name
            .split(", ")
            .next()
            .unwrap_or(&location.name)
            .to_string();

        Ok(Self {
            email: email.to_string(),
            town,
            lat: location.lat,
            lon: location.lon,
            radius_km: radius_miles * KM_PER_MILE,
            quality_levels: quality.iter().collect(),
            region: location.region.clone().unwrap_or_default(),
            country: location.country.clone().unwrap_or_default(),
        })
    }
}
