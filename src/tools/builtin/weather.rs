// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Current weather tool
//!
//! Geocodes the location with the Google Geocoding API, then asks
//! OpenWeatherMap for current conditions at those coordinates.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::ToolSettings;
use crate::error::ToolError;
use crate::tools::{SchemaBuilder, ToolDeclaration, ToolHandler};

pub(super) const FUNCTION_NAME: &str = "get_current_weather";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub(super) fn declaration() -> ToolDeclaration {
    ToolDeclaration::function(
        "Get Current Weather",
        FUNCTION_NAME,
        "Get the current weather in a given location",
        SchemaBuilder::new()
            .string(
                "location",
                "The city and state, e.g., San Francisco, CA",
                true,
            )
            .string_enum("unit", &["celsius", "fahrenheit"], false)
            .build(),
    )
    .with_label_description("Provides the current weather for a specified location.")
}

/// Weather lookup backed by two HTTP APIs.
///
/// API keys travel in query strings, so reqwest errors are reported
/// without their URL.
pub struct WeatherTool {
    client: Client,
    geocoding_url: String,
    weather_url: String,
    geocoding_api_key: Option<String>,
    weather_api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Coordinates {
    lat: f64,
    lon: f64,
}

impl WeatherTool {
    /// Build from tool settings, resolving API keys once
    pub fn from_settings(settings: &ToolSettings) -> Self {
        let geocoding_api_key = settings.resolve_geocoding_api_key();
        let weather_api_key = settings.resolve_weather_api_key();
        if geocoding_api_key.is_none() {
            tracing::warn!(
                target: "aide.tools.registry",
                env = %settings.geocoding_api_key_env,
                "geocoding API key not set, get_current_weather will fail"
            );
        }
        if weather_api_key.is_none() {
            tracing::warn!(
                target: "aide.tools.registry",
                env = %settings.weather_api_key_env,
                "weather API key not set, get_current_weather will fail"
            );
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            geocoding_url: settings.geocoding_url.clone(),
            weather_url: settings.weather_url.clone(),
            geocoding_api_key,
            weather_api_key,
        }
    }

    async fn coordinates(&self, location: &str) -> Result<Coordinates, ToolError> {
        let key = self.geocoding_api_key.as_deref().ok_or_else(|| {
            ToolError::Execution("geocoding API key is not configured".to_string())
        })?;

        let response = self
            .client
            .get(&self.geocoding_url)
            .query(&[("address", location), ("key", key)])
            .send()
            .await
            .map_err(|e| request_error("geocoding request failed", e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Execution(format!(
                "geocoding API returned {}: {}",
                status, body
            )));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| request_error("invalid geocoding response", e))?;

        match body.results.first() {
            Some(result) if body.status == "OK" => Ok(Coordinates {
                lat: result.geometry.location.lat,
                lon: result.geometry.location.lng,
            }),
            _ => Err(ToolError::Execution(format!(
                "location not found: {}",
                body.error_message
                    .unwrap_or_else(|| "No results found".to_string())
            ))),
        }
    }

    async fn current_weather(
        &self,
        coordinates: Coordinates,
        unit: &str,
    ) -> Result<CurrentWeather, ToolError> {
        let key = self.weather_api_key.as_deref().ok_or_else(|| {
            ToolError::Execution("weather API key is not configured".to_string())
        })?;

        let response = self
            .client
            .get(&self.weather_url)
            .query(&[
                ("lat", coordinates.lat.to_string()),
                ("lon", coordinates.lon.to_string()),
                ("appid", key.to_string()),
                ("units", units_param(unit).to_string()),
            ])
            .send()
            .await
            .map_err(|e| request_error("weather request failed", e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Execution(format!(
                "weather API returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| request_error("invalid weather response", e))
    }
}

/// Tool error for a failed HTTP exchange, with the keyed URL stripped
fn request_error(context: &str, err: reqwest::Error) -> ToolError {
    ToolError::Execution(format!("{}: {}", context, err.without_url()))
}

/// OpenWeatherMap `units` value for a requested unit
fn units_param(unit: &str) -> &'static str {
    match unit {
        "celsius" => "metric",
        "fahrenheit" => "imperial",
        _ => "standard",
    }
}

#[async_trait]
impl ToolHandler for WeatherTool {
    fn declaration(&self) -> ToolDeclaration {
        declaration()
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let location = arguments["location"]
            .as_str()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("location is required".to_string()))?;
        let unit = arguments["unit"].as_str().unwrap_or("celsius");

        let coordinates = self.coordinates(location).await?;
        let weather = self.current_weather(coordinates, unit).await?;

        let description = weather
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_default();

        Ok(serde_json::json!({
            "location": weather.name,
            "temperature": weather.main.temp,
            "unit": unit,
            "description": description,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    #[serde(default)]
    name: String,
    main: MainReading,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct MainReading {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    #[serde(default)]
    description: String,
}
