//! Forward geocoding: free text to coordinates.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::cache::PersistentCache;
use crate::config::GeocodingConfig;
use crate::error::SurfcastError;
use crate::models::Location;

/// Something that turns a query into ranked candidate places.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Candidates in upstream ranking order. An empty list is not an error.
    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>>;
}

#[async_trait]
impl<G: Geocoder + ?Sized> Geocoder for Box<G> {
    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>> {
        (**self).search(query).await
    }
}

/// One search hit as returned by Nominatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    /// Latitude as a numeric string
    pub lat: String,
    /// Longitude as a numeric string
    pub lon: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub address: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub country_code: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Address {
    /// city > town > village > county
    #[must_use]
    pub fn locality(&self) -> Option<&str> {
        non_empty(&self.city)
            .or_else(|| non_empty(&self.town))
            .or_else(|| non_empty(&self.village))
            .or_else(|| non_empty(&self.county))
    }

    /// state > region
    #[must_use]
    pub fn region_name(&self) -> Option<&str> {
        non_empty(&self.state).or_else(|| non_empty(&self.region))
    }

    #[must_use]
    pub fn country(&self) -> Option<String> {
        non_empty(&self.country_code).map(str::to_uppercase)
    }
}

impl GeocodeCandidate {
    /// "Locality, Region, CC", or the first three parts of `display_name`
    /// when the address has none of those fields.
    #[must_use]
    pub fn label(&self) -> String {
        let country = self.address.country();
        let parts: Vec<&str> = [
            self.address.locality(),
            self.address.region_name(),
            country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            self.display_name
                .split(',')
                .take(3)
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            parts.join(", ")
        }
    }

    /// Convert into a [`Location`], parsing the numeric coordinate strings.
    pub fn to_location(&self) -> Result<Location> {
        let lat: f64 = self.lat.trim().parse().map_err(|_| {
            SurfcastError::transport(format!("Invalid latitude '{}' in geocoding response", self.lat))
        })?;
        let lon: f64 = self.lon.trim().parse().map_err(|_| {
            SurfcastError::transport(format!("Invalid longitude '{}' in geocoding response", self.lon))
        })?;

        Ok(Location::new(lat, lon, self.label()).with_region(
            self.address.region_name().map(str::to_string),
            self.address.country(),
        ))
    }
}

/// Nominatim search client
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| SurfcastError::config(format!("Failed to create geocoding client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(name = "geocode", skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>> {
        let url = format!(
            "{}/search?q={}&format=json&limit=1&addressdetails=1",
            self.base_url,
            urlencoding::encode(query)
        );
        debug!("Nominatim request URL: {}", url);
        let start_time = Instant::now();

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SurfcastError::transport(format!("Geocoding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Geocoding returned status {}", status);
            return Err(SurfcastError::transport(format!(
                "Geocoding error: {}",
                status.canonical_reason().unwrap_or(status.as_str())
            )));
        }

        let candidates: Vec<GeocodeCandidate> = response.json().await.map_err(|e| {
            SurfcastError::transport(format!("Failed to parse geocoding response: {e}"))
        })?;

        info!(
            "Geocoding '{}' returned {} candidate(s) in {:.3}s",
            query,
            candidates.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(candidates)
    }
}

/// Memoizes another geocoder's answers in the persistent cache.
///
/// Cache failures are logged and bypassed, never surfaced.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: PersistentCache,
    ttl: Duration,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G, cache: PersistentCache, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    fn cache_key(query: &str) -> String {
        format!("geocode:{}", query.trim().to_lowercase())
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>> {
        let key = Self::cache_key(query);

        match self.cache.get::<Vec<GeocodeCandidate>>(&key).await {
            Ok(Some(hit)) => {
                debug!("Geocoding cache hit for '{}'", query);
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e) => warn!("Geocoding cache read failed: {}", e),
        }

        let candidates = self.inner.search(query).await?;

        // Empty answers are not cached so a retry can hit upstream again
        if !candidates.is_empty() {
            if let Err(e) = self.cache.put(&key, candidates.clone(), self.ttl).await {
                warn!("Geocoding cache write failed: {}", e);
            }
        }

        Ok(candidates)
    }
}
