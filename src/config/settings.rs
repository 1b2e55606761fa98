// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for the gateway
//!
//! Handles loading and saving settings from ~/.aide/settings.json

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::tools::ToolExecutionMode;

mod io;
mod validation;

/// Main settings structure, stored in ~/.aide/settings.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Upstream LLM provider settings
    #[serde(default)]
    pub upstream: UpstreamSettings,

    /// Tool execution and tool backend settings
    #[serde(default)]
    pub tools: ToolSettings,

    /// Document store settings
    #[serde(default)]
    pub storage: StorageSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// CORS origins; empty allows any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Upstream provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamSettings {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,

    /// API key (prefer the environment variable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_upstream_api_key_env")]
    pub api_key_env: String,

    /// Sent as `HTTP-Referer`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,

    /// Sent as `X-Title`
    #[serde(default = "default_site_name")]
    pub site_name: Option<String>,

    /// Timeout for the non-streaming call, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

/// Tool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// How sibling tool calls run
    #[serde(default)]
    pub execution: ToolExecutionMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoding_api_key: Option<String>,

    #[serde(default = "default_geocoding_api_key_env")]
    pub geocoding_api_key_env: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_api_key: Option<String>,

    #[serde(default = "default_weather_api_key_env")]
    pub weather_api_key_env: String,

    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    #[serde(default = "default_weather_url")]
    pub weather_url: String,
}

/// Document store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StorageSettings {
    /// Data directory; defaults to `<aide home>/data`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_upstream_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_upstream_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}

fn default_site_name() -> Option<String> {
    Some("Aide".to_string())
}

fn default_geocoding_api_key_env() -> String {
    "GOOGLE_GEOCODING_API_KEY".to_string()
}

fn default_weather_api_key_env() -> String {
    "OPENWEATHER_API_KEY".to_string()
}

fn default_geocoding_url() -> String {
    "https://maps.googleapis.com/maps/api/geocode/json".to_string()
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_origins: Vec::new(),
        }
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            api_key: None,
            api_key_env: default_upstream_api_key_env(),
            site_url: None,
            site_name: default_site_name(),
            request_timeout_secs: None,
        }
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            execution: ToolExecutionMode::default(),
            geocoding_api_key: None,
            geocoding_api_key_env: default_geocoding_api_key_env(),
            weather_api_key: None,
            weather_api_key_env: default_weather_api_key_env(),
            geocoding_url: default_geocoding_url(),
            weather_url: default_weather_url(),
        }
    }
}
