use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::models::{QualityFilter, Rating};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a config.toml. Defaults to the user config directory.
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Forecasts for spots near you
    Near {
        /// IANA timezone used to guess your location, e.g. Europe/Lisbon.
        /// Falls back to $TZ, then the configured default.
        #[arg(short, long, value_name = "IANA_ZONE")]
        timezone: Option<String>,

        /// Search near a place instead, e.g. "Newquay"
        #[arg(short, long, value_name = "QUERY")]
        location: Option<String>,

        /// Only show these ratings (repeatable). All ratings when omitted.
        #[arg(short, long = "quality", value_name = "RATING")]
        quality: Vec<Rating>,

        /// Only show this day (YYYY-MM-DD)
        #[arg(short, long, value_name = "DATE")]
        date: Option<NaiveDate>,
    },
    /// Multi-day forecast for one spot
    Spot {
        /// Spot id as returned by `near`
        id: String,

        /// Days to fetch. Defaults to the configured value.
        #[arg(long, value_name = "DAYS", value_parser = clap::value_parser!(u32).range(1..=16))]
        days: Option<u32>,

        #[arg(short, long = "quality", value_name = "RATING")]
        quality: Vec<Rating>,
    },
    /// Geocode a place name and print the result
    Locate {
        query: String,
    },
    /// Get an email when conditions near a place reach the chosen ratings
    Alert {
        /// Address the alert is sent to
        #[arg(long, value_name = "EMAIL")]
        email: String,

        /// Place to watch. Defaults to the location guessed from the timezone.
        #[arg(short, long, value_name = "QUERY")]
        location: Option<String>,

        #[arg(short, long, value_name = "IANA_ZONE")]
        timezone: Option<String>,

        /// Watch spots within this many miles
        #[arg(long, value_name = "MILES", default_value_t = 150.0)]
        radius_miles: f64,

        /// Ratings that trigger the alert (repeatable, at least one)
        #[arg(short, long = "quality", value_name = "RATING", required = true)]
        quality: Vec<Rating>,
    },
}

/// Collect repeated `--quality` flags into a filter
#[must_use]
pub fn quality_filter(ratings: &[Rating]) -> QualityFilter {
    ratings.iter().copied().collect()
}
