//! Client for the surf spot/forecast service

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::config::ApiConfig;
use crate::error::SurfcastError;
use crate::geo;
use crate::models::{AlertReceipt, AlertRequest, Location, Spot, SpotDetails, SpotForecast};

/// Source of spots and per-spot forecasts
#[async_trait]
pub trait SpotSource: Send + Sync {
    /// Spots within `max_distance_km` of `location`, each with its forecasts
    async fn spots_near(&self, location: &Location, max_distance_km: f64) -> Result<Vec<Spot>>;

    /// Multi-day forecast rows for a single spot
    async fn spot_forecasts(&self, spot_id: &str, days: u32) -> Result<Vec<SpotForecast>>;

    /// Static details (name, town, region) of a single spot
    async fn spot(&self, spot_id: &str) -> Result<SpotDetails>;

    /// Register a surf alert, returning the server's opaque alert id
    async fn create_alert(&self, request: &AlertRequest) -> Result<AlertReceipt>;
}

/// FastAPI-style error body, `{"detail": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

pub struct SurfApiClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl SurfApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("surfcast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SurfcastError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(200), Duration::from_secs(5))
            .build_with_max_retries(config.max_retries);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("Spot API request URL: {}", url);
        let response = self.client.get(url).send().await;
        Self::read_json(url, response).await
    }

    /// Status check and body decode shared by every endpoint.
    ///
    /// Non-success maps to `Transport` carrying the body's `detail` when the
    /// server sent one, otherwise the status text.
    async fn read_json<T: DeserializeOwned>(
        url: &str,
        response: reqwest_middleware::Result<reqwest::Response>,
    ) -> Result<T> {
        let response =
            response.map_err(|e| SurfcastError::transport(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Spot API returned status {} for {}", status, url);
            let reason = status.canonical_reason().unwrap_or(status.as_str()).to_string();
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.detail);
            return Err(SurfcastError::transport(detail.unwrap_or(reason)));
        }

        response
            .json()
            .await
            .map_err(|e| SurfcastError::transport(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl SpotSource for SurfApiClient {
    #[instrument(skip(self, location), fields(lat = location.lat, lon = location.lon))]
    async fn spots_near(&self, location: &Location, max_distance_km: f64) -> Result<Vec<Spot>> {
        let url = format!(
            "{}/api/spots/forecasted?lat={}&lon={}&max_distance_km={}",
            self.base_url, location.lat, location.lon, max_distance_km
        );
        let start_time = Instant::now();

        let spots: Vec<Spot> = self.get_json(&url).await?;

        let outside = spots
            .iter()
            .filter(|s| geo::distance_km(location.lat, location.lon, s.lat, s.lon) > max_distance_km)
            .count();
        if outside > 0 {
            warn!("{} spot(s) returned outside the {} km radius", outside, max_distance_km);
        }

        info!(
            "Fetched {} spot(s) near {} in {:.3}s",
            spots.len(),
            location.name,
            start_time.elapsed().as_secs_f64()
        );
        Ok(spots)
    }

    #[instrument(skip(self))]
    async fn spot_forecasts(&self, spot_id: &str, days: u32) -> Result<Vec<SpotForecast>> {
        let url = format!(
            "{}/api/spots/{}/forecasts?days={}",
            self.base_url,
            urlencoding::encode(spot_id),
            days
        );

        let rows: Vec<SpotForecast> = self.get_json(&url).await?;
        info!("Fetched {} forecast row(s) for spot {}", rows.len(), spot_id);
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn spot(&self, spot_id: &str) -> Result<SpotDetails> {
        let url = format!("{}/api/spots/{}", self.base_url, urlencoding::encode(spot_id));
        self.get_json(&url).await
    }

    #[instrument(skip(self, request), fields(town = %request.town))]
    async fn create_alert(&self, request: &AlertRequest) -> Result<AlertReceipt> {
        let url = format!("{}/api/alerts", self.base_url);
        debug!("Submitting alert for {} within {:.1} km", request.town, request.radius_km);

        let response = self.client.post(&url).json(request).send().await;
        let receipt: AlertReceipt = Self::read_json(&url, response).await?;

        info!("Created alert {}", receipt.alert_uuid);
        Ok(receipt)
    }
}
