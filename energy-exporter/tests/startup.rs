use std::{net::TcpListener, time::Duration};

use energy_exporter::{
    app::{self, StartupError},
    config::{AppConfig, ENV_BASE_URL, ENV_METRICS_BIND_ADDR, ENV_PASS, ENV_POLL_INTERVAL, ENV_USER},
};
use geo_client::GeoClient;
use httpmock::{Method::GET, Method::POST, MockServer};
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn config(server: &MockServer, bind_addr: &str) -> AppConfig {
    let base_url = server.base_url();
    let bind_addr = bind_addr.to_string();
    AppConfig::from_sources(None, move |key| match key {
        ENV_USER => Some("user@example.com".to_string()),
        ENV_PASS => Some("hunter2".to_string()),
        ENV_BASE_URL => Some(base_url.clone()),
        ENV_METRICS_BIND_ADDR => Some(bind_addr.clone()),
        ENV_POLL_INTERVAL => Some("1s".to_string()),
        _ => None,
    })
    .unwrap()
}

async fn mock_login(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(POST).path("/usersservice/v2/login");
            then.status(200).json_body(json!({ "accessToken": "tok-1" }));
        })
        .await;
}

async fn mock_devices(server: &MockServer, system_ids: &[&str]) {
    let details: Vec<_> = system_ids
        .iter()
        .map(|id| json!({ "name": "Home", "systemId": id }))
        .collect();
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/userapi/v2/user/detail-systems")
                .header("authorization", "Bearer tok-1");
            then.status(200).json_body(json!({ "systemDetails": details }));
        })
        .await;
}

fn value(body: &str, series: &str) -> Option<f64> {
    body.lines()
        .find_map(|line| line.strip_prefix(series)?.strip_prefix(' ')?.trim().parse().ok())
}

/// Run with the metrics address already taken: reaching the bind step would
/// fail with `StartupError::Bind` instead of the discovery error.
async fn run_with_occupied_bind_addr(server: &MockServer) -> StartupError {
    let occupied = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = occupied.local_addr().unwrap().to_string();

    app::run_until(config(server, &addr), CancellationToken::new())
        .await
        .unwrap_err()
}

#[tokio::test]
async fn bootstrap_binds_source_to_discovered_system() {
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    mock_devices(&server, &["sys-42"]).await;

    let cfg = config(&server, "127.0.0.1:0");
    let client = GeoClient::new(&cfg.geo.base_url, cfg.geo.request_timeout()).unwrap();
    let source = app::bootstrap(client, &cfg.geo).await.unwrap();

    assert_eq!(source.system_id(), "sys-42");
}

#[tokio::test]
async fn zero_devices_is_fatal_before_binding() {
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    mock_devices(&server, &[]).await;

    let err = run_with_occupied_bind_addr(&server).await;
    assert!(matches!(err, StartupError::DeviceCount(0)), "{err:?}");
}

#[tokio::test]
async fn multiple_devices_is_fatal_before_binding() {
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    mock_devices(&server, &["sys-1", "sys-2"]).await;

    let err = run_with_occupied_bind_addr(&server).await;
    assert!(matches!(err, StartupError::DeviceCount(2)), "{err:?}");
}

#[tokio::test]
async fn rejected_login_is_fatal() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/usersservice/v2/login");
            then.status(401).body("unauthorized");
        })
        .await;

    let err = run_with_occupied_bind_addr(&server).await;
    assert!(matches!(err, StartupError::Authentication(_)), "{err:?}");
}

#[tokio::test]
async fn discovery_failure_is_fatal() {
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/userapi/v2/user/detail-systems");
            then.status(500);
        })
        .await;

    let err = run_with_occupied_bind_addr(&server).await;
    assert!(matches!(err, StartupError::Discovery(_)), "{err:?}");
}

#[tokio::test]
async fn polls_and_serves_metrics_end_to_end() {
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    mock_devices(&server, &["sys-42"]).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/userapi/system/smets2-live-data/sys-42");
            then.status(200).json_body(json!({
                "power": [
                    { "type": "ELECTRICITY", "watts": 500.0, "valueAvailable": true },
                    { "type": "HEAT_PUMP", "watts": 10.0, "valueAvailable": true }
                ]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/userapi/system/smets2-periodic-data/sys-42");
            then.status(200).json_body(json!({
                "totalConsumptionList": [
                    { "commodityType": "GAS_ENERGY", "readingTime": 1704067200, "totalConsumption": 2000.0, "valueAvailable": true }
                ],
                "currentCostsElec": [{ "duration": "DAY", "costAmount": 150.0 }],
                "currentCostsElecTimestamp": 1704067200,
                "currentCostsGas": [],
                "currentCostsGasTimestamp": 1704067200
            }));
        })
        .await;

    let free = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = free.local_addr().unwrap();
    drop(free);

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(app::run_until(config(&server, &addr.to_string()), shutdown.clone()));

    let mut body = String::new();
    for _ in 0..50 {
        if let Ok(resp) = reqwest::get(format!("http://{addr}/metrics")).await {
            body = resp.text().await.unwrap_or_default();
            if body.contains("current_cost_delay_seconds{utility=\"gas\"}") {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    shutdown.cancel();
    task.await.unwrap().unwrap();

    assert_eq!(value(&body, "live_watts{utility=\"electricity\"}"), Some(500.0), "{body}");
    assert_eq!(value(&body, "live_watts{utility=\"gas\"}"), None, "{body}");
    assert_eq!(value(&body, "meter_reading{utility=\"gas\"}"), Some(2000.0), "{body}");
    assert!(value(&body, "current_cost_delay_seconds{utility=\"electricity\"}").is_some(), "{body}");
    assert!(!body.contains("HEAT_PUMP"), "{body}");
}
