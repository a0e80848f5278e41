use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};

use surfcast::aggregator::{self, DateGroup, TimelineEntry, VisibleSpot};
use surfcast::cli::{self, Cli, Commands};
use surfcast::session::{self, FetchState, Session};
use surfcast::{
    AlertRequest, CachedGeocoder, Geocoder, LocationResolver, NominatimGeocoder, PersistentCache,
    SpotSource, SurfApiClient, SurfcastConfig, SurfcastError, logging,
};

fn build_geocoder(config: &SurfcastConfig) -> Result<Box<dyn Geocoder>> {
    let nominatim = NominatimGeocoder::new(&config.geocoding)?;
    if !config.cache.enabled {
        return Ok(Box::new(nominatim));
    }

    match PersistentCache::open(config.cache_dir()) {
        Ok(cache) => {
            let ttl = Duration::from_secs(u64::from(config.cache.ttl_hours) * 3600);
            Ok(Box::new(CachedGeocoder::new(nominatim, cache, ttl)))
        }
        Err(e) => {
            warn!("Geocoding cache unavailable, continuing without it: {}", e);
            Ok(Box::new(nominatim))
        }
    }
}

/// --timezone, then $TZ, then the configured default. Unknown zones are skipped.
fn ambient_timezone(flag: Option<String>, config: &SurfcastConfig) -> String {
    flag.into_iter()
        .chain(std::env::var("TZ").ok())
        .find(|tz| {
            let known = tz.parse::<chrono_tz::Tz>().is_ok();
            if !known {
                warn!("Ignoring unknown timezone '{}'", tz);
            }
            known
        })
        .unwrap_or_else(|| config.defaults.timezone.clone())
}

fn print_timeline(timeline: &[TimelineEntry]) {
    println!("Best conditions:");
    for entry in timeline {
        let rating = entry
            .best_rating
            .map_or_else(|| "-".to_string(), |r| r.to_string());
        println!("  {}  {}", entry.date.format("%a %d %b"), rating);
    }
}

fn print_days(days: &[DateGroup]) {
    for group in days {
        println!("    {}", group.date.format("%a %d %b"));
        for forecast in &group.forecasts {
            println!(
                "      {:<5}  {:<9}  swell {:<14}  wind {}",
                forecast.time,
                forecast.rating,
                forecast.format_swell(),
                forecast.format_wind()
            );
        }
    }
}

fn print_spots(spots: &[VisibleSpot]) {
    if spots.is_empty() {
        println!("No spots match the current filters.");
        return;
    }
    for visible in spots {
        let spot = &visible.spot.spot;
        let region = spot.region.as_deref().unwrap_or("");
        println!(
            "  - {} {} ({:.1} mi away)",
            spot.name, region, visible.spot.distance_miles
        );
        if let Some(first) = spot.headline() {
            println!("    Next up: {} {} {}", first.date, first.time, first.rating);
        }
        print_days(&visible.days);
    }
}

async fn near(
    config: &SurfcastConfig,
    timezone: Option<String>,
    query: Option<String>,
    quality: &[surfcast::Rating],
    date: Option<chrono::NaiveDate>,
) -> Result<()> {
    let resolver = LocationResolver::new(build_geocoder(config)?);
    let api = SurfApiClient::new(&config.api)?;
    let mut session = Session::new();

    let tz = ambient_timezone(timezone, config);
    session.begin_resolving();
    let ambient = resolver.resolve_ambient(&tz).await;
    let mut ticket = session.set_location(ambient);

    if let Some(query) = query {
        match session.search(&resolver, &query).await {
            Ok(manual) => ticket = manual,
            Err(e) => eprintln!("{}", e.user_message()),
        }
    }

    let result = ticket.run(&api, config.api.max_distance_km).await;
    session.apply_fetch(&ticket, result);
    session.set_quality(cli::quality_filter(quality));
    session.set_date(date);

    let today = session::today_in(&tz, Utc::now())?;
    let view = session.view(today, config.defaults.timeline_days);

    if let Some(location) = view.location {
        println!(
            "Spots near {} ({})",
            location.name,
            location.format_coordinates()
        );
    }
    if let FetchState::Failed(message) = view.status {
        anyhow::bail!("{message}");
    }

    print_timeline(&view.timeline);
    println!();
    print_spots(&view.spots);
    Ok(())
}

async fn spot(
    config: &SurfcastConfig,
    id: &str,
    days: Option<u32>,
    quality: &[surfcast::Rating],
) -> Result<()> {
    let api = SurfApiClient::new(&config.api)?;
    let days = days.unwrap_or(config.api.forecast_days);

    let title = match api.spot(id).await {
        Ok(details) => details.title(),
        Err(e) => {
            warn!("Could not load details for spot {}: {}", id, e);
            id.to_string()
        }
    };

    let rows = api.spot_forecasts(id, days).await?;
    let forecasts: Vec<_> = rows.into_iter().filter_map(|row| row.into_forecast()).collect();
    let filtered = aggregator::filter_by_quality(&forecasts, &cli::quality_filter(quality));
    info!("{} of {} forecast(s) pass the filter", filtered.len(), forecasts.len());

    println!("Forecast for {title} ({days} days)");
    if filtered.is_empty() {
        println!("No forecasts match the current filters.");
        return Ok(());
    }
    print_days(&aggregator::group_by_date(filtered));
    Ok(())
}

async fn locate(config: &SurfcastConfig, query: &str) -> Result<()> {
    let resolver = LocationResolver::new(build_geocoder(config)?);
    let location = resolver.geocode(query).await?;
    println!("{} ({})", location.name, location.format_coordinates());
    Ok(())
}

async fn alert(
    config: &SurfcastConfig,
    email: &str,
    timezone: Option<String>,
    query: Option<String>,
    radius_miles: f64,
    quality: &[surfcast::Rating],
) -> Result<()> {
    let resolver = LocationResolver::new(build_geocoder(config)?);
    let location = match query {
        Some(query) => resolver.geocode(&query).await?,
        None => {
            let tz = ambient_timezone(timezone, config);
            resolver.resolve_ambient(&tz).await
        }
    };

    let request = AlertRequest::new(email, &location, radius_miles, &cli::quality_filter(quality))?;
    let api = SurfApiClient::new(&config.api)?;
    let receipt = api.create_alert(&request).await?;

    println!(
        "Alert created for {} within {:.0} mi of {}",
        request.email, radius_miles, location.name
    );
    println!("{}", receipt.alert_uuid);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = SurfcastConfig::load_from_path(cli.config.clone())
        .context("Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose);

    match cli.command {
        Commands::Near {
            timezone,
            location,
            quality,
            date,
        } => near(&config, timezone, location, &quality, date).await,
        Commands::Spot { id, days, quality } => spot(&config, &id, days, &quality).await,
        Commands::Locate { query } => locate(&config, &query).await,
        Commands::Alert {
            email,
            location,
            timezone,
            radius_miles,
            quality,
        } => alert(&config, &email, timezone, location, radius_miles, &quality).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<SurfcastError>() {
            Some(err) if !matches!(err, SurfcastError::Config { .. }) => {
                eprintln!("{}", err.user_message());
            }
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}
