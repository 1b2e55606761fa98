// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! OpenRouter API client
//!
//! Implements `UpstreamClient` for OpenRouter and any other endpoint that
//! speaks the OpenAI chat-completion protocol.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;

use crate::config::UpstreamSettings;
use crate::error::{ApiError, GatewayError, Result};
use crate::llm::provider::{ByteStream, ChatParams, CompletionResponse, UpstreamClient};
use crate::llm::providers::common::{
    join_url, parse_retry_after_seconds, server_error, transport_error,
};

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RATE_LIMIT_WAIT: u64 = 60;

/// OpenRouter client
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    endpoint: String,
    site_url: Option<String>,
    site_name: Option<String>,
    request_timeout: Option<Duration>,
}

impl OpenRouterClient {
    /// Create a client for the public OpenRouter endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, OPENROUTER_API_URL)
    }

    /// Create with a custom base URL (`/chat/completions` is appended)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl AsRef<str>) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: api_key.into(),
            endpoint: join_url(base_url.as_ref(), "chat/completions"),
            site_url: None,
            site_name: Some("Aide".to_string()),
            request_timeout: None,
        }
    }

    /// Build from upstream settings, resolving the API key from env or file
    pub fn from_settings(settings: &UpstreamSettings) -> Result<Self> {
        let api_key = settings.resolve_api_key().ok_or_else(|| {
            GatewayError::Config(format!(
                "no upstream API key: set {} or upstream.api_key",
                settings.api_key_env
            ))
        })?;

        let mut client = Self::with_base_url(api_key, &settings.base_url);
        client.site_url = settings.site_url.clone();
        client.site_name = settings.site_name.clone();
        client.request_timeout = settings.request_timeout_secs.map(Duration::from_secs);
        Ok(client)
    }

    /// Set the site URL sent as `HTTP-Referer`
    pub fn with_site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = Some(url.into());
        self
    }

    /// Set the site name sent as `X-Title`
    pub fn with_site_name(mut self, name: impl Into<String>) -> Self {
        self.site_name = Some(name.into());
        self
    }

    /// Overall timeout for the non-streaming call
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// The full chat-completion URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, params: &ChatParams) -> RequestBuilder {
        let mut req = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", &self.api_key))
            .header("Content-Type", "application/json");

        // Optional headers for OpenRouter rankings
        if let Some(ref site_url) = self.site_url {
            req = req.header("HTTP-Referer", site_url);
        }
        if let Some(ref site_name) = self.site_name {
            req = req.header("X-Title", site_name);
        }

        req.json(params)
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response> {
        let response = req.send().await.map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after_seconds(response.headers());
            let body = response.text().await.unwrap_or_default();
            let body = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("").to_string()
            } else {
                body
            };
            return Err(Self::parse_error(status.as_u16(), &body, retry_after));
        }

        Ok(response)
    }

    /// Parse an error response
    fn parse_error(status: u16, body: &str, retry_after: Option<u64>) -> GatewayError {
        let (message, code) = match serde_json::from_str::<OpenRouterError>(body) {
            Ok(error_response) => {
                let code = match error_response.error.code {
                    Some(serde_json::Value::String(code)) => code,
                    _ => String::new(),
                };
                (error_response.error.message, code)
            }
            Err(_) => (body.to_string(), String::new()),
        };

        match (code.as_str(), status) {
            ("invalid_api_key" | "authentication_error", _) | (_, 401) => {
                GatewayError::Api(ApiError::AuthenticationFailed(message))
            }
            ("rate_limit_exceeded", _) | (_, 429) => GatewayError::Api(ApiError::RateLimited {
                retry_after: retry_after.unwrap_or(DEFAULT_RATE_LIMIT_WAIT),
                message,
            }),
            ("model_not_found", _) => {
                GatewayError::Api(ApiError::ModelNotFound { status, message })
            }
            _ => server_error(status, message),
        }
    }
}

#[async_trait]
impl UpstreamClient for OpenRouterClient {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, params: ChatParams) -> Result<CompletionResponse> {
        let params = params.with_stream(false);
        tracing::debug!(
            target: "aide.llm.openrouter",
            model = %params.model,
            messages = params.messages.len(),
            tools = params.tools.len(),
            "sending completion request"
        );

        let mut req = self.request(&params);
        if let Some(timeout) = self.request_timeout {
            req = req.timeout(timeout);
        }
        let response = self.send(req).await?;

        let body = response.text().await.map_err(transport_error)?;
        serde_json::from_str::<CompletionResponse>(&body).map_err(|e| {
            GatewayError::Api(ApiError::InvalidResponse(format!(
                "undecodable completion body: {}",
                e
            )))
        })
    }

    async fn complete_stream(&self, params: ChatParams) -> Result<ByteStream> {
        let params = params.with_stream(true);
        tracing::debug!(
            target: "aide.llm.openrouter",
            model = %params.model,
            messages = params.messages.len(),
            "opening completion stream"
        );

        let response = self.send(self.request(&params)).await?;

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| GatewayError::Api(ApiError::StreamError(e.to_string()))));
        Ok(Box::pin(stream))
    }
}

#[derive(Debug, Deserialize)]
struct OpenRouterError {
    error: OpenRouterErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenRouterErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new() {
        let client = OpenRouterClient::new("test-key");
        assert_eq!(client.api_key, "test-key");
        assert_eq!(
            client.endpoint(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(client.site_name.as_deref(), Some("Aide"));
    }

    #[test]
    fn test_client_with_base_url() {
        let client = OpenRouterClient::with_base_url("k", "http://localhost:4000/v1/");
        assert_eq!(client.endpoint(), "http://localhost:4000/v1/chat/completions");
    }

    #[test]
    fn test_client_with_site_info() {
        let client = OpenRouterClient::new("k")
            .with_site_url("https://aide.example")
            .with_site_name("Aide Dev")
            .with_request_timeout(Duration::from_secs(5));
        assert_eq!(client.site_url.as_deref(), Some("https://aide.example"));
        assert_eq!(client.site_name.as_deref(), Some("Aide Dev"));
        assert_eq!(client.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_from_settings_requires_key() {
        let settings = UpstreamSettings {
            api_key: None,
            api_key_env: "AIDE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        let err = OpenRouterClient::from_settings(&settings).err().unwrap();
        assert!(matches!(err, GatewayError::Config(_)));
        assert!(err.to_string().contains("AIDE_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_from_settings_uses_file_key() {
        let settings = UpstreamSettings {
            api_key: Some("file-key".to_string()),
            api_key_env: "AIDE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            base_url: "http://127.0.0.1:1".to_string(),
            request_timeout_secs: Some(3),
            ..Default::default()
        };
        let client = OpenRouterClient::from_settings(&settings).unwrap();
        assert_eq!(client.api_key, "file-key");
        assert_eq!(client.endpoint(), "http://127.0.0.1:1/chat/completions");
        assert_eq!(client.request_timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_parse_error_authentication() {
        let body = r#"{"error": {"code": 401, "message": "No auth credentials found"}}"#;
        let error = OpenRouterClient::parse_error(401, body, None);

        match error {
            GatewayError::Api(ApiError::AuthenticationFailed(message)) => {
                assert_eq!(message, "No auth credentials found")
            }
            other => panic!("Expected AuthenticationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_rate_limit_uses_retry_after() {
        let body = r#"{"error": {"code": "rate_limit_exceeded", "message": "Too many requests"}}"#;
        let error = OpenRouterClient::parse_error(429, body, Some(7));
        match error {
            GatewayError::Api(ApiError::RateLimited {
                retry_after,
                message,
            }) => {
                assert_eq!(retry_after, 7);
                assert_eq!(message, "Too many requests");
            }
            other => panic!("Expected RateLimited, got {:?}", other),
        }

        let error = OpenRouterClient::parse_error(429, body, None);
        assert!(matches!(
            error,
            GatewayError::Api(ApiError::RateLimited {
                retry_after: DEFAULT_RATE_LIMIT_WAIT,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_error_model_not_found() {
        let body = r#"{"error": {"code": "model_not_found", "message": "Model xyz not found"}}"#;
        let error = OpenRouterClient::parse_error(404, body, None);
        assert!(matches!(
            error,
            GatewayError::Api(ApiError::ModelNotFound { status: 404, ref message })
                if message.contains("xyz")
        ));

        let error = OpenRouterClient::parse_error(400, body, None);
        assert_eq!(error.status_code(), 400);
    }

    #[test]
    fn test_parse_error_keeps_upstream_status() {
        let body = r#"{"error": {"code": 502, "message": "provider returned error"}}"#;
        let error = OpenRouterClient::parse_error(502, body, None);
        assert_eq!(error.status_code(), 502);
        assert!(error.to_string().contains("provider returned error"));
    }

    #[test]
    fn test_parse_error_non_json_body() {
        let error = OpenRouterClient::parse_error(503, "Service Unavailable", None);
        match error {
            GatewayError::Api(ApiError::ServerError { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("Expected ServerError, got {:?}", other),
        }
    }
}
