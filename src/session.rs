//! Session controller
//!
//! Owns the location and fetch state machines plus the user's filter state.
//! Location: `Unresolved -> Resolving -> Resolved`. Fetch: `Idle -> Loading
//! -> Loaded | Failed`, re-entering `Loading` whenever a new location is set.
//!
//! Every fetch is tagged with a [`FetchTicket`]. A completion is applied only
//! when its ticket carries the latest generation, so a slow response for an
//! old location can never overwrite the spots of the current one.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::Result;
use crate::aggregator::{self, TimelineEntry, VisibleSpot};
use crate::error::SurfcastError;
use crate::geocode::Geocoder;
use crate::location_resolver::LocationResolver;
use crate::models::{Location, QualityFilter, Rating, Spot};
use crate::surf_api::SpotSource;

#[derive(Debug, Clone, PartialEq)]
pub enum LocationState {
    Unresolved,
    Resolving,
    Resolved(Location),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Handle for one outstanding spot fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    generation: u64,
    location: Location,
}

impl FetchTicket {
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Perform the fetch this ticket was issued for.
    pub async fn run<S: SpotSource + ?Sized>(
        &self,
        source: &S,
        max_distance_km: f64,
    ) -> Result<Vec<Spot>> {
        source.spots_near(&self.location, max_distance_km).await
    }
}

/// Everything a view renders, derived from the current session state
#[derive(Debug)]
pub struct SessionView<'a> {
    pub location: Option<&'a Location>,
    pub status: &'a FetchState,
    pub spots: Vec<VisibleSpot>,
    pub timeline: Vec<TimelineEntry>,
    pub error: Option<&'a str>,
}

#[derive(Debug)]
pub struct Session {
    location: LocationState,
    fetch: FetchState,
    generation: u64,
    spots: Vec<Spot>,
    quality: QualityFilter,
    selected_date: Option<NaiveDate>,
    last_error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            location: LocationState::Unresolved,
            fetch: FetchState::Idle,
            generation: 0,
            spots: Vec::new(),
            quality: QualityFilter::all(),
            selected_date: None,
            last_error: None,
        }
    }

    #[must_use]
    pub fn location_state(&self) -> &LocationState {
        &self.location
    }

    #[must_use]
    pub fn location(&self) -> Option<&Location> {
        match &self.location {
            LocationState::Resolved(location) => Some(location),
            _ => None,
        }
    }

    #[must_use]
    pub fn fetch_state(&self) -> &FetchState {
        &self.fetch
    }

    #[must_use]
    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    #[must_use]
    pub fn quality(&self) -> &QualityFilter {
        &self.quality
    }

    #[must_use]
    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected_date
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Mark ambient resolution as started. No effect once a location exists.
    pub fn begin_resolving(&mut self) {
        if self.location == LocationState::Unresolved {
            self.location = LocationState::Resolving;
        }
    }

    /// Replace the location and start a new fetch cycle.
    pub fn set_location(&mut self, location: Location) -> FetchTicket {
        info!(
            "Location set to {} ({})",
            location.name,
            location.format_coordinates()
        );
        self.generation += 1;
        self.location = LocationState::Resolved(location.clone());
        self.fetch = FetchState::Loading;
        self.spots.clear();
        self.last_error = None;

        FetchTicket {
            generation: self.generation,
            location,
        }
    }

    /// Apply a fetch completion. Returns false when the ticket is stale and
    /// the result was discarded.
    pub fn apply_fetch(&mut self, ticket: &FetchTicket, result: Result<Vec<Spot>>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "Discarding stale fetch for {} (generation {} < {})",
                ticket.location.name, ticket.generation, self.generation
            );
            return false;
        }

        match result {
            Ok(spots) => {
                debug!("Loaded {} spot(s)", spots.len());
                self.spots = spots;
                self.fetch = FetchState::Loaded;
            }
            Err(e) => {
                warn!("Spot fetch failed: {}", e);
                self.spots.clear();
                self.fetch = FetchState::Failed(e.user_message());
            }
        }
        true
    }

    /// Manual location search. On failure the current location stays in
    /// effect and the error is kept for display.
    pub async fn search<G: Geocoder>(
        &mut self,
        resolver: &LocationResolver<G>,
        query: &str,
    ) -> Result<FetchTicket> {
        match resolver.geocode(query).await {
            Ok(location) => Ok(self.set_location(location)),
            Err(e) => {
                warn!("Location search for '{}' failed: {}", query, e);
                self.last_error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Fetch spots for the current location and apply the result.
    pub async fn refresh<S: SpotSource + ?Sized>(
        &mut self,
        source: &S,
        max_distance_km: f64,
    ) -> Result<bool> {
        let location = self
            .location()
            .cloned()
            .ok_or_else(|| SurfcastError::validation("No location resolved yet"))?;
        let ticket = self.set_location(location);
        let result = ticket.run(source, max_distance_km).await;
        Ok(self.apply_fetch(&ticket, result))
    }

    pub fn toggle_quality(&mut self, rating: Rating) {
        self.quality.toggle(rating);
    }

    pub fn set_quality(&mut self, quality: QualityFilter) {
        self.quality = quality;
    }

    /// Restrict the list to one day; `None` shows every day.
    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.selected_date = date;
    }

    /// Recompute every derived value from the current state.
    #[must_use]
    pub fn view(&self, today: NaiveDate, window_days: u32) -> SessionView<'_> {
        let spots = match self.location() {
            Some(location) => {
                aggregator::visible_spots(location, &self.spots, &self.quality, self.selected_date)
            }
            None => Vec::new(),
        };

        SessionView {
            location: self.location(),
            status: &self.fetch,
            spots,
            timeline: aggregator::timeline(&self.spots, &self.quality, today, window_days),
            error: self.last_error.as_deref(),
        }
    }
}

/// Calendar date at `now` in the named IANA timezone
pub fn today_in(timezone_id: &str, now: DateTime<Utc>) -> Result<NaiveDate> {
    let tz: chrono_tz::Tz = timezone_id
        .parse()
        .map_err(|_| SurfcastError::validation(format!("Unknown timezone '{timezone_id}'")))?;
    Ok(now.with_timezone(&tz).date_naive())
}
