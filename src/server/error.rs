// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! HTTP error responses

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{GatewayError, Result};

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(target: "aide.server", status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(target: "aide.server", status = status.as_u16(), error = %self, "request rejected");
        }

        let body = serde_json::json!({
            "error": {
                "message": self.to_string(),
                "type": self.kind(),
                "status": status.as_u16(),
            }
        });
        (status, Json(body)).into_response()
    }
}

/// Parse a JSON request body, reporting failures in the gateway error shape
pub(crate) fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid JSON body: {}", e)))
}
