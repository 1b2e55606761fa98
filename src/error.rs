// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for the gateway
//!
//! Request-level failures are `GatewayError`s and reach the HTTP caller.
//! Tool-level failures are `ToolError`s and are always folded back into the
//! conversation by the tool invoker.

use thiserror::Error;

/// Main error type for gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The chat request is missing required fields
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream provider errors
    #[error("Upstream error: {0}")]
    Api(#[from] ApiError),

    /// A stored document was not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Upstream LLM provider errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Authentication failed (invalid API key)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limited by the provider
    #[error("Rate limited: {message} (retry after {retry_after} seconds)")]
    RateLimited { retry_after: u64, message: String },

    /// Requested model not found
    #[error("Model not found: {message}")]
    ModelNotFound { status: u16, message: String },

    /// Provider returned a non-2xx status
    #[error("API error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Response body could not be understood
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Network connectivity error
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout waiting for response
    #[error("Request timed out")]
    Timeout,

    /// Streaming error after the stream started
    #[error("Streaming error: {0}")]
    StreamError(String),
}

/// Tool dispatch errors, recovered into a tool result message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("tool not found")]
    NotFound(String),

    #[error("tool is disabled")]
    Disabled(String),

    #[error("{0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Execution(String),
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

impl ApiError {
    /// HTTP status to surface to the caller for this upstream failure
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::AuthenticationFailed(_) => 401,
            ApiError::RateLimited { .. } => 429,
            ApiError::ModelNotFound { status, .. } => *status,
            ApiError::ServerError { status, .. } => *status,
            ApiError::InvalidResponse(_) => 500,
            ApiError::Network(_) | ApiError::StreamError(_) => 502,
            ApiError::Timeout => 504,
        }
    }

    /// Short machine-readable kind used in error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::AuthenticationFailed(_) => "authentication_error",
            ApiError::RateLimited { .. } => "rate_limit_error",
            ApiError::ModelNotFound { .. } => "model_not_found",
            ApiError::ServerError { .. } => "upstream_error",
            ApiError::InvalidResponse(_) => "invalid_upstream_response",
            ApiError::Network(_) => "network_error",
            ApiError::Timeout => "timeout",
            ApiError::StreamError(_) => "stream_error",
        }
    }
}

impl GatewayError {
    /// HTTP status for a request-level failure
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::InvalidRequest(_) => 400,
            GatewayError::NotFound(_) => 404,
            GatewayError::Api(e) => e.status_code(),
            GatewayError::Http(e) if e.is_timeout() => 504,
            GatewayError::Http(_) => 502,
            _ => 500,
        }
    }

    /// Short machine-readable kind used in error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidRequest(_) => "invalid_request",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::Api(e) => e.kind(),
            GatewayError::Config(_) => "configuration_error",
            GatewayError::Storage(_) => "storage_error",
            GatewayError::Http(_) => "network_error",
            GatewayError::Io(_) | GatewayError::Json(_) => "internal_error",
        }
    }
}
