//! JMA fixtures served from a local mock server.

#![allow(dead_code)]

use jma_forecast::config::{Config, StorageMode};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn area_catalog() -> Value {
    json!({
        "centers": {
            "010100": {"name": "北海道地方", "enName": "Hokkaido", "children": ["016000"]},
            "010300": {"name": "関東甲信地方", "enName": "Kanto Koshin", "children": ["130000"]}
        },
        "offices": {
            "016000": {"name": "石狩・空知・後志地方", "parent": "010100", "children": ["016010"]},
            "130000": {"name": "東京都", "parent": "010300", "children": ["130010", "130020"]}
        },
        "class10s": {
            "016010": {"name": "石狩地方", "parent": "016000"},
            "130010": {"name": "東京地方", "parent": "130000"},
            "130020": {"name": "伊豆諸島北部", "parent": "130000"}
        }
    })
}

pub fn tokyo_forecast() -> Value {
    json!([
        {
            "publishingOffice": "気象庁",
            "reportDatetime": "2024-01-01T17:00:00+09:00",
            "timeSeries": [
                {
                    "timeDefines": [
                        "2024-01-01T17:00:00+09:00",
                        "2024-01-02T00:00:00+09:00",
                        "2024-01-03T00:00:00+09:00"
                    ],
                    "areas": [
                        {
                            "area": {"name": "東京地方", "code": "130010"},
                            "weatherCodes": ["100", "200", "300"],
                            "weathers": ["晴れ", "くもり", "雨"],
                            "winds": ["北の風", "北の風　やや強く", "南の風"],
                            "waves": ["０．５メートル", "１メートル", "１．５メートル"]
                        },
                        {
                            "area": {"name": "伊豆諸島北部", "code": "130020"},
                            "weatherCodes": ["201"]
                        }
                    ]
                }
            ]
        },
        {
            "publishingOffice": "気象庁",
            "timeSeries": [
                {
                    "timeDefines": ["2024-01-04T00:00:00+09:00"],
                    "areas": [{"area": {"name": "東京", "code": "130010"}, "weatherCodes": ["101"]}]
                }
            ]
        }
    ])
}

/// Mock JMA with the catalog, Tokyo's forecast and a failing Hokkaido office.
pub async fn mock_jma() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/area.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(area_catalog()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast/130000.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokyo_forecast()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast/016000.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    server
}

pub fn test_config(server: &MockServer, storage_mode: StorageMode) -> Config {
    Config {
        storage_mode,
        database_url: "sqlite::memory:".to_string(),
        jma_area_url: format!("{}/area.json", server.uri()),
        jma_forecast_base_url: format!("{}/forecast", server.uri()),
        jma_icon_base_url: "https://icons.test/img".to_string(),
        jma_timeout_seconds: 5,
        sync_retry_delay_seconds: 0,
        disable_rate_limiting: true,
        ..Config::default()
    }
}
