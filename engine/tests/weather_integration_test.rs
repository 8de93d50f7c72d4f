//! Weather tool against a mock OpenWeatherMap endpoint

use recall_engine::config::WeatherConfig;
use recall_engine::tools::{ToolRegistry, WeatherTool};
use recall_engine::secrets::SecretString;
use sdk::errors::EngineError;
use sdk::types::{FailureKind, ToolCallRequest};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const APPID: &str = "0123456789abcdef0123456789abcdef";

fn tool(server: &MockServer) -> WeatherTool {
    let config = WeatherConfig {
        base_url: server.uri(),
        ..WeatherConfig::default()
    };
    WeatherTool::new(&config, SecretString::from(APPID)).unwrap()
}

#[tokio::test]
async fn test_current_weather_is_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Chandigarh"))
        .and(query_param("appid", APPID))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Chandigarh",
            "main": {"temp": 31.4, "feels_like": 33.0, "humidity": 48},
            "weather": [{"main": "Clouds", "description": "scattered clouds"}],
            "wind": {"speed": 3.6}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let weather = tool(&server).current("  Chandigarh ").await.unwrap();
    assert_eq!(
        weather,
        json!({
            "city": "Chandigarh",
            "temperature": 31.4,
            "feels_like": 33.0,
            "humidity": 48.0,
            "wind_speed": 3.6,
            "condition": "scattered clouds",
            "units": "metric"
        })
    );
}

#[tokio::test]
async fn test_unknown_city() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "cod": "404", "message": "city not found"
        })))
        .mount(&server)
        .await;

    let err = tool(&server).current("Atlantis").await.unwrap_err();
    assert!(matches!(err, EngineError::ToolExecution(ref m) if m.contains("City 'Atlantis' not found")));
}

#[tokio::test]
async fn test_errors_never_leak_the_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": format!("internal error for appid={}", APPID)
        })))
        .mount(&server)
        .await;

    let err = tool(&server).current("Paris").await.unwrap_err().to_string();
    assert!(err.contains("500"));
    assert!(!err.contains(APPID));
}

#[tokio::test]
async fn test_slow_service_reports_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"main": {"temp": 20.0}}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = WeatherConfig {
        base_url: server.uri(),
        ..WeatherConfig::default()
    };
    let slow = WeatherTool::with_request_timeout(&config, SecretString::from(APPID), Duration::from_millis(50))
        .unwrap();

    let mut registry = ToolRegistry::empty();
    registry.register(Arc::new(slow)).unwrap();

    let request = ToolCallRequest::from_json("w1", "get_weather", json!({"city": "Paris"}));
    let result = registry.resolve(&request, Duration::from_secs(5)).await;
    assert_eq!(result.error().unwrap().kind, FailureKind::Timeout);
}

#[tokio::test]
async fn test_resolved_through_registry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "cod": 401, "message": "Invalid API key"
        })))
        .mount(&server)
        .await;

    let mut registry = ToolRegistry::empty();
    registry.register(Arc::new(tool(&server))).unwrap();

    let request = ToolCallRequest::from_json("w1", "get_weather", json!({"city": "Paris"}));
    let result = registry.resolve(&request, Duration::from_secs(5)).await;
    let failure = result.error().unwrap();
    assert_eq!(failure.kind, FailureKind::Execution);
    assert!(failure.message.contains("rejected the API key"));

    let empty = ToolCallRequest::from_json("w2", "get_weather", json!({"city": "   "}));
    let result = registry.resolve(&empty, Duration::from_secs(5)).await;
    assert_eq!(result.error().unwrap().kind, FailureKind::InvalidArguments);
}
