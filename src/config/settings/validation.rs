// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::net::SocketAddr;

use crate::error::{GatewayError, Result};

use super::{Settings, ToolSettings, UpstreamSettings};

/// Read a secret: env var first, then the file value. Blank values count as unset.
fn resolve_secret(env_name: &str, file_value: Option<&String>) -> Option<String> {
    std::env::var(env_name)
        .ok()
        .or_else(|| file_value.cloned())
        .filter(|v| !v.trim().is_empty())
}

fn check_http_url(field: &str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(GatewayError::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            field, url
        )))
    }
}

impl UpstreamSettings {
    /// Get the upstream API key, checking env var first.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret(&self.api_key_env, self.api_key.as_ref())
    }
}

impl ToolSettings {
    /// Get the geocoding API key, checking env var first.
    pub fn resolve_geocoding_api_key(&self) -> Option<String> {
        resolve_secret(&self.geocoding_api_key_env, self.geocoding_api_key.as_ref())
    }

    /// Get the weather API key, checking env var first.
    pub fn resolve_weather_api_key(&self) -> Option<String> {
        resolve_secret(&self.weather_api_key_env, self.weather_api_key.as_ref())
    }
}

impl Settings {
    /// CORS origins, with `ALLOWED_ORIGINS` (comma-separated) taking priority.
    pub fn allowed_origins(&self) -> Vec<String> {
        match std::env::var("ALLOWED_ORIGINS") {
            Ok(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            _ => self.server.allowed_origins.clone(),
        }
    }

    /// The listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind.parse().map_err(|e| {
            GatewayError::Config(format!("invalid bind address '{}': {}", self.server.bind, e))
        })
    }

    /// Check settings that would otherwise fail late.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        check_http_url("upstream.base_url", &self.upstream.base_url)?;
        check_http_url("tools.geocoding_url", &self.tools.geocoding_url)?;
        check_http_url("tools.weather_url", &self.tools.weather_url)?;

        if self.upstream.request_timeout_secs == Some(0) {
            return Err(GatewayError::Config(
                "upstream.request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
