use city_weather_service::{build_state, config::Config, create_router};
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn test_config(cities_file: &Path, open_meteo_url: String) -> Config {
    Config {
        port: 0,
        open_meteo_url,
        cities_file: cities_file.to_path_buf(),
        cache_capacity: 100,
        cache_ttl: None,
        upstream_timeout: Duration::from_millis(500),
        upstream_max_retries: 0,
        update_concurrency: 1,
        log_format: "pretty".to_string(),
    }
}

/// Serve the router on an ephemeral port and return its base URL
async fn spawn_app(config: &Config) -> String {
    let state = build_state(config, CancellationToken::new())
        .await
        .expect("Failed to build state");
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    format!("http://{}", addr)
}

async fn get_json(client: &reqwest::Client, url: String) -> Value {
    client
        .get(url)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON")
}

#[tokio::test]
async fn test_add_list_delete_scenario() {
    let dir = TempDir::new().expect("temp dir");
    let cities_file = dir.path().join("europe.csv");
    tokio::fs::write(
        &cities_file,
        "country,capital,latitude,longitude\nFrance,Paris,48.85,2.35\n",
    )
    .await
    .expect("write fixture");

    let base = spawn_app(&test_config(&cities_file, "http://127.0.0.1:9".into())).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/cities", base))
        .json(&json!({ "country": "Spain", "capital": "Madrid", "latitude": 40.4, "longitude": -3.7 }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({ "message": "City added successfully!" }));

    let cities = get_json(&client, format!("{}/cities", base)).await;
    assert_eq!(
        cities,
        json!([
            { "country": "France", "capital": "Paris", "latitude": 48.85, "longitude": 2.35 },
            { "country": "Spain", "capital": "Madrid", "latitude": 40.4, "longitude": -3.7 }
        ])
    );

    let response = client
        .delete(format!("{}/cities/france", base))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({ "message": "City from france deleted successfully!" }));

    let cities = get_json(&client, format!("{}/cities", base)).await;
    assert_eq!(
        cities,
        json!([{ "country": "Spain", "capital": "Madrid", "latitude": 40.4, "longitude": -3.7 }])
    );

    let on_disk = tokio::fs::read_to_string(&cities_file).await.expect("read");
    assert_eq!(on_disk, "country,capital,latitude,longitude\nSpain,Madrid,40.4,-3.7\n");
}

#[tokio::test]
async fn test_delete_unknown_country_returns_404() {
    let dir = TempDir::new().expect("temp dir");
    let base = spawn_app(&test_config(
        &dir.path().join("europe.csv"),
        "http://127.0.0.1:9".into(),
    ))
    .await;

    let response = reqwest::Client::new()
        .delete(format!("{}/cities/Narnia", base))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert!(
        body["error"]
            .as_str()
            .unwrap_or_default()
            .contains("City with country Narnia not found")
    );
}

#[tokio::test]
async fn test_malformed_city_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let cities_file = dir.path().join("europe.csv");
    let base = spawn_app(&test_config(&cities_file, "http://127.0.0.1:9".into())).await;
    let client = reqwest::Client::new();

    let missing_field = client
        .post(format!("{}/cities", base))
        .json(&json!({ "country": "Spain", "capital": "Madrid" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(missing_field.status().as_u16(), 400);

    let out_of_range = client
        .post(format!("{}/cities", base))
        .json(&json!({ "country": "Spain", "capital": "Madrid", "latitude": 140.4, "longitude": -3.7 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(out_of_range.status().as_u16(), 400);
    let body: Value = out_of_range.json().await.expect("Failed to parse JSON");
    assert!(body["error"].as_str().unwrap_or_default().contains("latitude"));

    let cities = get_json(&client, format!("{}/cities", base)).await;
    assert_eq!(cities, json!([]));
    assert!(!cities_file.exists());
}

#[tokio::test]
async fn test_update_isolates_timeouts_per_city() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "48.85"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "hourly": { "temperature_2m": [12.0] } }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "40.4"))
        .and(query_param("timezone", "Europe/Madrid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hourly": { "temperature_2m": [21.4567, 20.9] }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    let cities_file = dir.path().join("europe.csv");
    tokio::fs::write(
        &cities_file,
        "country,capital,latitude,longitude\nFrance,Paris,48.85,2.35\nSpain,Madrid,40.4,-3.7\n",
    )
    .await
    .expect("write fixture");

    let base = spawn_app(&test_config(
        &cities_file,
        format!("{}/v1/forecast", mock_server.uri()),
    ))
    .await;
    let client = reqwest::Client::new();

    let report = get_json(&client, format!("{}/update", base)).await;
    assert_eq!(
        report,
        json!({ "France": "Request timed out", "Spain": 21.46 })
    );

    // Spain is cached now, so the second update makes no new request for it
    let report = get_json(&client, format!("{}/update", base)).await;
    assert_eq!(report["Spain"], json!(21.46));
}

#[tokio::test]
async fn test_update_reports_missing_data_and_errors_inline() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("latitude", "41.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hourly": { "temperature_2m": [null] }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("latitude", "38.72"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reason": "bad" })))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    let cities_file = dir.path().join("europe.csv");
    tokio::fs::write(
        &cities_file,
        "country,capital,latitude,longitude\nItaly,Rome,41.9,12.5\nPortugal,Lisbon,38.72,-9.14\n",
    )
    .await
    .expect("write fixture");

    let base = spawn_app(&test_config(&cities_file, mock_server.uri())).await;
    let report = get_json(&reqwest::Client::new(), format!("{}/update", base)).await;

    assert_eq!(report["Italy"], json!("Data not available"));
    assert!(
        report["Portugal"]
            .as_str()
            .unwrap_or_default()
            .starts_with("Error: JSON parse error")
    );
}

#[tokio::test]
async fn test_index_and_health() {
    let dir = TempDir::new().expect("temp dir");
    let base = spawn_app(&test_config(
        &dir.path().join("europe.csv"),
        "http://127.0.0.1:9".into(),
    ))
    .await;
    let client = reqwest::Client::new();

    let page = client
        .get(format!("{}/", base))
        .send()
        .await
        .expect("Failed to send request");
    assert!(page.status().is_success());
    let html = page.text().await.expect("Failed to read body");
    assert!(html.contains("<html"));

    let health = get_json(&client, format!("{}/health", base)).await;
    assert_eq!(health["status"], "ok");
}
