//! JMA client behavior against a mock server.
//!
//! Run with: cargo test --test jma_client_test

mod common;

use jma_forecast::config::StorageMode;
use jma_forecast::error::AppError;
use jma_forecast::forecast::{self, TimePrecision};
use jma_forecast::hierarchy::{build_hierarchy, HierarchyDepth};
use jma_forecast::jma::JmaClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn catalog_builds_full_hierarchy() {
    let server = common::mock_jma().await;
    let client = JmaClient::new(&common::test_config(&server, StorageMode::Memory)).unwrap();

    let catalog = tokio_test::assert_ok!(client.get_area_catalog().await);
    let hierarchy = build_hierarchy(&catalog, HierarchyDepth::Areas);

    let tokyo = &hierarchy["010300"].prefectures[0];
    assert_eq!(tokyo.name, "東京都");
    let areas: Vec<_> = tokyo.areas.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(areas, vec!["130010", "130020"]);
}

#[tokio::test]
async fn error_status_is_a_transport_failure() {
    let server = common::mock_jma().await;
    let client = JmaClient::new(&common::test_config(&server, StorageMode::Memory)).unwrap();

    let err = client.get_forecast("016000").await.unwrap_err();
    assert!(err.is_transport(), "got {err:?}");
}

#[tokio::test]
async fn unreachable_host_is_a_transport_failure() {
    let server = MockServer::start().await;
    let mut config = common::test_config(&server, StorageMode::Memory);
    config.jma_area_url = "http://127.0.0.1:9/area.json".to_string();
    let client = JmaClient::new(&config).unwrap();

    let err = client.get_area_catalog().await.unwrap_err();
    assert!(err.is_transport(), "got {err:?}");
}

#[tokio::test]
async fn unexpected_shapes_are_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/area.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"offices": {}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast/130000.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = JmaClient::new(&common::test_config(&server, StorageMode::Memory)).unwrap();

    let err = client.get_area_catalog().await.unwrap_err();
    assert!(matches!(err, AppError::MalformedPayload(_)), "got {err:?}");

    let err = client.get_forecast("130000").await.unwrap_err();
    assert!(matches!(err, AppError::MalformedPayload(_)), "got {err:?}");
}

#[tokio::test]
async fn fetched_forecast_normalizes_per_area() {
    let server = common::mock_jma().await;
    let client = JmaClient::new(&common::test_config(&server, StorageMode::Memory)).unwrap();

    let document = client.get_forecast("130000").await.unwrap();
    let entries = forecast::normalize(&document, TimePrecision::Minute);

    let names: Vec<_> = entries.iter().map(|e| e.area_name.as_str()).collect();
    assert_eq!(names, vec!["東京地方", "東京地方", "東京地方", "伊豆諸島北部", "東京"]);
    assert_eq!(entries[0].time, "2024-01-01T17:00");
    assert_eq!(entries[3].weather_description.as_deref(), Some("曇り 時々 晴れ"));

    let short_term = forecast::normalize_short_term(&document, 2);
    assert_eq!(short_term.len(), 3);
    assert!(short_term.iter().all(|e| e.time.len() == 10));
}

#[tokio::test]
async fn hierarchy_follows_catalog_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/area.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "centers": {
                    "010300": {"name": "関東甲信地方", "children": ["130000"]},
                    "010100": {"name": "北海道地方", "children": ["016000"]}
                },
                "offices": {
                    "130000": {"name": "東京都", "parent": "010300", "children": []},
                    "016000": {"name": "石狩・空知・後志地方", "parent": "010100", "children": []}
                }
            }"#,
        ))
        .mount(&server)
        .await;

    let client = JmaClient::new(&common::test_config(&server, StorageMode::Memory)).unwrap();
    let catalog = client.get_area_catalog().await.unwrap();
    let hierarchy = build_hierarchy(&catalog, HierarchyDepth::Prefectures);

    let ids: Vec<&str> = hierarchy.keys().map(String::as_str).collect();
    assert_eq!(ids, ["010300", "010100"]);
}
