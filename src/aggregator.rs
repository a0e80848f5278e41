//! Forecast aggregation
//!
//! Turns a resolved location, the spots near it and the user's filter state
//! into the derived values the views render: distance-ranked spots, rating
//! and date filters, per-day groups and the multi-day timeline.
//!
//! Everything here is a pure function of its inputs and is recomputed on
//! every change rather than maintained incrementally.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::models::{Forecast, Location, QualityFilter, Rating, Spot};

/// Number of days shown on the timeline, starting today.
pub const DEFAULT_TIMELINE_DAYS: u32 = 9;

/// A spot annotated with its distance from the current location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbySpot {
    pub spot: Spot,
    pub distance_miles: f64,
}

/// Forecasts sharing one calendar date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateGroup {
    pub date: NaiveDate,
    pub forecasts: Vec<Forecast>,
}

/// Best rating found across all spots on a single day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub date: NaiveDate,
    pub best_rating: Option<Rating>,
}

/// A spot that survives the current filters, with its forecasts grouped by day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleSpot {
    pub spot: NearbySpot,
    pub days: Vec<DateGroup>,
}

/// Attach the distance from `location` to each spot. Input is left untouched.
#[must_use]
pub fn with_distance(location: &Location, spots: &[Spot]) -> Vec<NearbySpot> {
    spots
        .iter()
        .map(|spot| NearbySpot {
            distance_miles: location.miles_to(spot.lat, spot.lon),
            spot: spot.clone(),
        })
        .collect()
}

/// Closest first. Spots at equal distance keep their input order.
#[must_use]
pub fn sort_by_distance(mut spots: Vec<NearbySpot>) -> Vec<NearbySpot> {
    spots.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));
    spots
}

/// Keep forecasts whose rating passes the filter. An empty filter keeps all.
#[must_use]
pub fn filter_by_quality(forecasts: &[Forecast], quality: &QualityFilter) -> Vec<Forecast> {
    forecasts
        .iter()
        .filter(|f| quality.allows(f.rating))
        .cloned()
        .collect()
}

/// Keep forecasts on `date`; `None` means no restriction.
#[must_use]
pub fn filter_by_date(forecasts: Vec<Forecast>, date: Option<NaiveDate>) -> Vec<Forecast> {
    match date {
        Some(date) => forecasts.into_iter().filter(|f| f.date == date).collect(),
        None => forecasts,
    }
}

/// Partition forecasts by date.
///
/// Groups appear in the order their date is first seen. Inside a group the
/// forecasts are ordered by clock time; equal times keep input order.
#[must_use]
pub fn group_by_date(forecasts: Vec<Forecast>) -> Vec<DateGroup> {
    let mut groups: Vec<DateGroup> = Vec::new();

    for forecast in forecasts {
        match groups.iter_mut().find(|g| g.date == forecast.date) {
            Some(group) => group.forecasts.push(forecast),
            None => groups.push(DateGroup {
                date: forecast.date,
                forecasts: vec![forecast],
            }),
        }
    }

    for group in &mut groups {
        group.forecasts.sort_by(|a, b| a.time.cmp(&b.time));
    }

    groups
}

/// A spot renders only when something survives both filters.
#[must_use]
pub fn spot_is_visible(spot: &Spot, quality: &QualityFilter, date: Option<NaiveDate>) -> bool {
    spot.forecasts
        .iter()
        .any(|f| quality.allows(f.rating) && date.is_none_or(|d| f.date == d))
}

/// Best significant rating per day for `window_days` days starting at `today`.
#[must_use]
pub fn timeline(
    spots: &[Spot],
    quality: &QualityFilter,
    today: NaiveDate,
    window_days: u32,
) -> Vec<TimelineEntry> {
    (0..window_days)
        .filter_map(|offset| today.checked_add_days(Days::new(u64::from(offset))))
        .map(|date| TimelineEntry {
            date,
            best_rating: best_rating_on(spots, quality, date),
        })
        .collect()
}

fn best_rating_on(spots: &[Spot], quality: &QualityFilter, date: NaiveDate) -> Option<Rating> {
    let mut best: Option<Rating> = None;

    let candidates = spots
        .iter()
        .flat_map(|spot| spot.forecasts.iter())
        .filter(|f| f.date == date && quality.allows(f.rating) && f.rating.is_significant());

    for forecast in candidates {
        if forecast.rating == Rating::Firing {
            return Some(Rating::Firing);
        }
        if best.is_none_or(|b| forecast.rating > b) {
            best = Some(forecast.rating);
        }
    }

    best
}

/// Distance-ranked spots that pass the filters, each with its filtered
/// forecasts grouped by day.
#[must_use]
pub fn visible_spots(
    location: &Location,
    spots: &[Spot],
    quality: &QualityFilter,
    date: Option<NaiveDate>,
) -> Vec<VisibleSpot> {
    sort_by_distance(with_distance(location, spots))
        .into_iter()
        .filter(|nearby| spot_is_visible(&nearby.spot, quality, date))
        .map(|nearby| {
            let forecasts = filter_by_date(filter_by_quality(&nearby.spot.forecasts, quality), date);
            VisibleSpot {
                days: group_by_date(forecasts),
                spot: nearby,
            }
        })
        .collect()
}
