//! Current-weather Core Tool
//!
//! Queries the OpenWeatherMap "current weather" endpoint. Every request carries
//! the API key as a query parameter, so anything derived from the request URL
//! is scrubbed before it reaches a log line or an error message.

use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::tool::{ParamType, Tool, ToolArgs, ToolSchema};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::WeatherConfig;
use crate::secrets::{scrub_secrets, SecretString};

/// HTTP timeout for one weather request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WeatherTool {
    schema: ToolSchema,
    base_url: String,
    units: String,
    api_key: SecretString,
    request_timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    name: Option<String>,
    main: MainReadings,
    #[serde(default)]
    weather: Vec<Condition>,
    wind: Option<Wind>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

impl WeatherTool {
    pub fn new(config: &WeatherConfig, api_key: SecretString) -> Result<Self, EngineError> {
        Self::with_request_timeout(config, api_key, REQUEST_TIMEOUT)
    }

    pub fn with_request_timeout(
        config: &WeatherConfig,
        api_key: SecretString,
        request_timeout: Duration,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| EngineError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            schema: ToolSchema::new().required(
                "city",
                ParamType::String,
                "City name, optionally with country code (e.g. \"Chandigarh\" or \"Paris,FR\")",
            ),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            units: config.units.clone(),
            api_key,
            request_timeout,
            client,
        })
    }

    /// Fetch and normalize current conditions for `city`
    pub async fn current(&self, city: &str) -> Result<Value, EngineError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(EngineError::ToolArgument {
                tool: "get_weather".to_string(),
                reason: "city must not be empty".to_string(),
            });
        }

        info!("Fetching weather for {}", city);

        let url = format!("{}/weather", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.expose()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!("Weather request for {} timed out", city);
                    return EngineError::ToolTimeout(self.request_timeout);
                }
                let reason = scrub_secrets(&e.without_url().to_string());
                warn!("Weather request for {} failed: {}", city, reason);
                EngineError::ToolExecution(format!("Weather service unreachable: {}", reason))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| status.to_string());
            let message = scrub_secrets(&message);
            warn!("Weather API returned {} for {}: {}", status, city, message);

            return Err(EngineError::ToolExecution(match status.as_u16() {
                404 => format!("City '{}' not found", city),
                401 => "Weather service rejected the API key".to_string(),
                _ => format!("Weather service error ({}): {}", status.as_u16(), message),
            }));
        }

        let data: CurrentWeather = response.json().await.map_err(|e| {
            EngineError::ToolExecution(format!(
                "Unexpected weather response: {}",
                scrub_secrets(&e.without_url().to_string())
            ))
        })?;

        let result = json!({
            "city": data.name.unwrap_or_else(|| city.to_string()),
            "temperature": data.main.temp,
            "feels_like": data.main.feels_like,
            "humidity": data.main.humidity,
            "wind_speed": data.wind.and_then(|w| w.speed),
            "condition": data
                .weather
                .first()
                .map(|c| c.description.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            "units": self.units,
        });

        debug!("Weather data: {}", result);
        Ok(result)
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather for a city: temperature, feels-like temperature, humidity, wind speed and a short condition description."
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn invoke(&self, args: ToolArgs) -> Result<Value, EngineError> {
        self.current(args.str("city")?).await
    }
}
