//! `surfcast` - surf forecasts for spots near you
//!
//! Resolves where the user is, fetches forecasts for nearby surf spots and
//! reduces them into distance-ranked, filtered and date-grouped views plus a
//! multi-day "best conditions" timeline.

pub mod aggregator;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod geo;
pub mod geocode;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod session;
pub mod surf_api;

// Re-export core types for public API
pub use aggregator::{DateGroup, NearbySpot, TimelineEntry, VisibleSpot};
pub use cache::PersistentCache;
pub use config::SurfcastConfig;
pub use error::SurfcastError;
pub use geocode::{CachedGeocoder, Geocoder, NominatimGeocoder};
pub use location_resolver::LocationResolver;
pub use models::{
    AlertReceipt, AlertRequest, Forecast, Location, QualityFilter, Rating, Spot, SpotDetails,
    SpotForecast,
};
pub use session::{FetchState, LocationState, Session};
pub use surf_api::{SpotSource, SurfApiClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SurfcastError>;
