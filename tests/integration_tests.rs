//! Integration tests for surfcast against mock HTTP servers.

use std::process::Command;
use std::time::Duration;

use surfcast::config::{ApiConfig, GeocodingConfig};
use surfcast::{
    AlertRequest, CachedGeocoder, FetchState, Geocoder, Location, LocationResolver,
    NominatimGeocoder, PersistentCache, QualityFilter, Rating, Session, SpotSource, SurfApiClient,
    SurfcastError,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn geocoding_config(server: &MockServer) -> GeocodingConfig {
    GeocodingConfig {
        base_url: server.uri(),
        user_agent: "surfcast-tests".to_string(),
        timeout_seconds: 5,
    }
}

fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
        max_retries: 0,
        ..ApiConfig::default()
    }
}

fn nominatim_hit() -> serde_json::Value {
    serde_json::json!([{
        "lat": "50.4155",
        "lon": "-5.0737",
        "display_name": "Newquay, Cornwall, England, TR7, United Kingdom",
        "address": {
            "town": "Newquay",
            "county": "Cornwall",
            "state": "England",
            "country_code": "gb"
        }
    }])
}

fn spot_json(id: &str, lat: f64, lon: f64, forecasts: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": id,
        "region": "Cornwall",
        "lat": lat,
        "lon": lon,
        "forecasts": forecasts
    })
}

fn forecast_json(date: &str, time: &str, rating: &str) -> serde_json::Value {
    serde_json::json!({
        "date": date,
        "time": time,
        "rating": rating,
        "swell_wave_height": 1.4,
        "swell_wave_peak_period": 12.0,
        "swell_wave_direction": 285.0,
        "wind_speed_kmh": 9.0,
        "wind_type": "offshore",
        "wind_severity": "light",
        "explanation": "Clean groundswell"
    })
}

#[tokio::test]
async fn test_geocode_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Newquay"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "1"))
        .and(query_param("addressdetails", "1"))
        .and(header("user-agent", "surfcast-tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nominatim_hit()))
        .mount(&mock_server)
        .await;

    let geocoder = NominatimGeocoder::new(&geocoding_config(&mock_server)).unwrap();
    let resolver = LocationResolver::new(geocoder);

    let location = resolver.geocode("Newquay").await.unwrap();

    assert_eq!(location.name, "Newquay, England, GB");
    assert_eq!(location.lat, 50.4155);
    assert_eq!(location.lon, -5.0737);
    assert_eq!(location.country.as_deref(), Some("GB"));
}

#[tokio::test]
async fn test_geocode_no_match_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let geocoder = NominatimGeocoder::new(&geocoding_config(&mock_server)).unwrap();
    let resolver = LocationResolver::new(geocoder);

    let err = resolver.geocode("Atlantis").await.unwrap_err();
    assert!(matches!(err, SurfcastError::NotFound { .. }));
}

#[tokio::test]
async fn test_geocode_server_error_is_transport() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let geocoder = NominatimGeocoder::new(&geocoding_config(&mock_server)).unwrap();
    let err = geocoder.search("Newquay").await.unwrap_err();

    match err {
        SurfcastError::Transport { message } => assert!(message.contains("Service Unavailable")),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ambient_resolution_falls_back_when_geocoder_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Costa Rica"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let geocoder = NominatimGeocoder::new(&geocoding_config(&mock_server)).unwrap();
    let resolver = LocationResolver::new(geocoder);

    let location = resolver.resolve_ambient("America/Costa_Rica").await;
    assert_eq!((location.lat, location.lon), (0.0, 0.0));
    assert_eq!(location.name, "Costa Rica");
}

#[tokio::test]
async fn test_cached_geocoder_hits_upstream_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nominatim_hit()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = PersistentCache::open(dir.path()).unwrap();
    let geocoder = CachedGeocoder::new(
        NominatimGeocoder::new(&geocoding_config(&mock_server)).unwrap(),
        cache,
        Duration::from_secs(3600),
    );

    let first = geocoder.search("Newquay").await.unwrap();
    let second = geocoder.search("  newquay ").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_spots_near() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/spots/forecasted"))
        .and(query_param("lat", "50.4155"))
        .and(query_param("lon", "-5.0737"))
        .and(query_param("max_distance_km", "500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            spot_json("fistral", 50.4167, -5.1, serde_json::json!([
                forecast_json("2025-06-01", "06:00", "Solid"),
                forecast_json("2025-06-01", "09:00", "Lake mode"),
            ])),
        ])))
        .mount(&mock_server)
        .await;

    let client = SurfApiClient::new(&api_config(&mock_server)).unwrap();
    let here = surfcast::Location::new(50.4155, -5.0737, "Newquay");

    let spots = client.spots_near(&here, 500.0).await.unwrap();

    assert_eq!(spots.len(), 1);
    assert_eq!(spots[0].id, "fistral");
    assert_eq!(spots[0].forecasts[0].rating, Rating::Solid);
    assert_eq!(spots[0].forecasts[1].rating, Rating::LakeMode);
}

#[tokio::test]
async fn test_spot_forecasts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/spots/fistral/forecasts"))
        .and(query_param("days", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "time": "2025-06-01T06:00",
                "swell_wave_height": 1.2,
                "swell_wave_direction": 290.0,
                "wind_wave_height_m": 0.3,
                "swell_wave_peak_period": 11.0,
                "wind_speed_kmh": 12.0,
                "wind_direction_deg": 90.0,
                "wind_type": "offshore",
                "wind_severity": "light",
                "explanation": null,
                "rating": "Firing",
                "timezone": "Europe/London"
            },
            {
                "time": "2025-06-01T09:00",
                "swell_wave_height": 1.1,
                "swell_wave_direction": null,
                "wind_wave_height_m": null,
                "swell_wave_peak_period": null,
                "wind_speed_kmh": null,
                "wind_direction_deg": null,
                "wind_type": null,
                "wind_severity": null,
                "explanation": null,
                "rating": null,
                "timezone": null
            }
        ])))
        .mount(&mock_server)
        .await;

    let client = SurfApiClient::new(&api_config(&mock_server)).unwrap();

    let rows = client.spot_forecasts("fistral", 10).await.unwrap();
    assert_eq!(rows.len(), 2);

    let forecasts: Vec<_> = rows.into_iter().filter_map(|r| r.into_forecast()).collect();
    assert_eq!(forecasts.len(), 1);
    assert_eq!(forecasts[0].time, "06:00");
    assert_eq!(forecasts[0].rating, Rating::Firing);
}

#[tokio::test]
async fn test_spot_api_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/spots/nowhere/forecasts"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = SurfApiClient::new(&api_config(&mock_server)).unwrap();
    let err = client.spot_forecasts("nowhere", 10).await.unwrap_err();

    match err {
        SurfcastError::Transport { message } => assert_eq!(message, "Not Found"),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_spot_details() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/spots/fistral"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "fistral",
            "name": "Fistral",
            "town": "Newquay",
            "region": "Cornwall",
            "lat": 50.4167,
            "lon": -5.1,
            "timezone": "Europe/London"
        })))
        .mount(&mock_server)
        .await;

    let client = SurfApiClient::new(&api_config(&mock_server)).unwrap();
    let details = client.spot("fistral").await.unwrap();

    assert_eq!(details.name, "Fistral");
    assert_eq!(details.lat, Some(50.4167));
    assert_eq!(details.title(), "Fistral (Newquay, Cornwall)");
}

#[tokio::test]
async fn test_spot_details_not_found_uses_detail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/spots/nowhere"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "detail": "Spot not found" })),
        )
        .mount(&mock_server)
        .await;

    let client = SurfApiClient::new(&api_config(&mock_server)).unwrap();
    let err = client.spot("nowhere").await.unwrap_err();

    match err {
        SurfcastError::Transport { message } => assert_eq!(message, "Spot not found"),
        other => panic!("expected transport error, got {other:?}"),
    }
}

fn alert_request() -> AlertRequest {
    let quality: QualityFilter = [Rating::Solid, Rating::Firing].into_iter().collect();
    let location = Location::new(50.4155, -5.0737, "Newquay, England, GB")
        .with_region(Some("England".to_string()), Some("GB".to_string()));
    AlertRequest::new("rider@example.com", &location, 150.0, &quality).unwrap()
}

#[tokio::test]
async fn test_create_alert() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/alerts"))
        .and(body_partial_json(serde_json::json!({
            "email": "rider@example.com",
            "town": "Newquay",
            "quality_levels": ["Solid", "Firing"],
            "region": "England",
            "country": "GB"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "alert_uuid": "6f1c2a9e-0d4b-4f57-9b0e-2d6a1f3c8e11"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = SurfApiClient::new(&api_config(&mock_server)).unwrap();
    let receipt = client.create_alert(&alert_request()).await.unwrap();

    assert_eq!(receipt.alert_uuid, "6f1c2a9e-0d4b-4f57-9b0e-2d6a1f3c8e11");
}

#[tokio::test]
async fn test_create_alert_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/alerts"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "detail": "Alert already exists" })),
        )
        .mount(&mock_server)
        .await;

    let client = SurfApiClient::new(&api_config(&mock_server)).unwrap();
    let err = client.create_alert(&alert_request()).await.unwrap_err();

    match err {
        SurfcastError::Transport { message } => assert_eq!(message, "Alert already exists"),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_session_end_to_end() {
    let geocode_server = MockServer::start().await;
    let api_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nominatim_hit()))
        .mount(&geocode_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/spots/forecasted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            spot_json("watergate", 50.445, -5.04, serde_json::json!([
                forecast_json("2025-06-02", "06:00", "Playable"),
            ])),
            spot_json("fistral", 50.4167, -5.1, serde_json::json!([
                forecast_json("2025-06-01", "09:00", "Firing"),
                forecast_json("2025-06-01", "06:00", "Sketchy"),
            ])),
        ])))
        .mount(&api_server)
        .await;

    let resolver =
        LocationResolver::new(NominatimGeocoder::new(&geocoding_config(&geocode_server)).unwrap());
    let api = SurfApiClient::new(&api_config(&api_server)).unwrap();
    let mut session = Session::new();

    session.begin_resolving();
    let ticket = session.search(&resolver, "Newquay").await.unwrap();
    let result = ticket.run(&api, 500.0).await;
    assert!(session.apply_fetch(&ticket, result));
    assert_eq!(session.fetch_state(), &FetchState::Loaded);

    let today = chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let view = session.view(today, 9);

    assert_eq!(view.location.unwrap().name, "Newquay, England, GB");
    let ids: Vec<&str> = view.spots.iter().map(|v| v.spot.spot.id.as_str()).collect();
    assert_eq!(ids, vec!["fistral", "watergate"]);
    assert_eq!(view.spots[0].days[0].forecasts[0].time, "06:00");
    assert_eq!(view.timeline[0].best_rating, Some(Rating::Firing));
    assert_eq!(view.timeline[1].best_rating, Some(Rating::Playable));
}

#[tokio::test]
async fn test_session_fetch_failure() {
    let api_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/spots/forecasted"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&api_server)
        .await;

    let api = SurfApiClient::new(&api_config(&api_server)).unwrap();
    let mut session = Session::new();
    session.set_location(surfcast::Location::new(50.4155, -5.0737, "Newquay"));

    assert!(session.refresh(&api, 500.0).await.unwrap());
    match session.fetch_state() {
        FetchState::Failed(message) => assert!(message.contains("Bad Gateway")),
        other => panic!("unexpected state {other:?}"),
    }
}

/// The CLI shows help
#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_surfcast"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("near"));
    assert!(stdout.contains("locate"));
}

/// Unknown ratings are rejected before any network call
#[test]
fn test_cli_rejects_bad_rating() {
    let output = Command::new(env!("CARGO_BIN_EXE_surfcast"))
        .args(["near", "--quality", "epic"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown rating"));
}

/// Run the binary against a mock spot API with caching off
async fn run_cli(server: &MockServer, args: &[&str]) -> std::process::Output {
    let uri = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("missing.toml");
    let mut command = Command::new(env!("CARGO_BIN_EXE_surfcast"));
    command
        .arg("--config")
        .arg(&config_path)
        .args(args)
        .env("SURFCAST_API__BASE_URL", &uri)
        .env("SURFCAST_API__MAX_RETRIES", "0")
        .env("SURFCAST_CACHE__ENABLED", "false")
        .env_remove("RUST_LOG");

    tokio::task::spawn_blocking(move || command.output().expect("Failed to execute command"))
        .await
        .unwrap()
}

/// A failed spot fetch goes to stderr with a failing exit status
#[tokio::test]
async fn test_cli_near_fetch_failure_exits_non_zero() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/spots/forecasted"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let output = run_cli(&mock_server, &["near", "--timezone", "Europe/London"]).await;

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Bad Gateway"));
    assert!(!stdout.contains("Bad Gateway"));
}

#[tokio::test]
async fn test_cli_alert_prints_uuid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/alerts"))
        .and(body_partial_json(serde_json::json!({
            "town": "London",
            "quality_levels": ["Firing"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "alert_uuid": "alert-123"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let output = run_cli(
        &mock_server,
        &[
            "alert",
            "--email",
            "rider@example.com",
            "--timezone",
            "Europe/London",
            "--quality",
            "firing",
        ],
    )
    .await;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("alert-123"));
}

#[tokio::test]
async fn test_cli_spot_header_uses_details() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/spots/fistral"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "fistral",
            "name": "Fistral",
            "town": "Newquay",
            "region": "Cornwall",
            "lat": null,
            "lon": null
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/spots/fistral/forecasts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let output = run_cli(&mock_server, &["spot", "fistral", "--days", "3"]).await;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Forecast for Fistral (Newquay, Cornwall) (3 days)"));
}

#[tokio::test]
async fn test_cli_spot_header_falls_back_to_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/spots/fistral"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/spots/fistral/forecasts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let output = run_cli(&mock_server, &["spot", "fistral", "--days", "3"]).await;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Forecast for fistral (3 days)"));
}
