//! Data models for surfcast
//!
//! - Location: resolved place the user searches around
//! - Spot: surf spot with its forecasts
//! - Forecast: rated surf predictions and rating filters
//! - AlertRequest: surf alert subscription

pub mod alert;
pub mod forecast;
pub mod location;
pub mod spot;

pub use alert::{AlertReceipt, AlertRequest};
pub use forecast::{Forecast, QualityFilter, Rating, SpotForecast};
pub use location::Location;
pub use spot::{Spot, SpotDetails};
