// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool endpoints

use axum::{body::Bytes, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{GatewayError, Result};
use crate::llm::message::{Message, ToolCallRequest};
use crate::server::error::parse_json;
use crate::server::state::AppState;
use crate::tools::ToolDeclaration;

#[derive(Debug, Deserialize)]
struct SaveToolsRequest {
    #[serde(default)]
    tools: Option<Vec<ToolDeclaration>>,
}

/// Direct tool execution request
#[derive(Debug, Deserialize)]
pub struct ToolUseRequest {
    pub tool_name: String,
    /// Arguments as an object or a JSON-encoded string
    #[serde(default)]
    pub tool_args: Value,
    #[serde(default)]
    pub tool_call_id: Option<String>,
}

impl ToolUseRequest {
    /// The equivalent model-issued tool call
    pub fn into_call(self) -> ToolCallRequest {
        let arguments = match self.tool_args {
            Value::String(raw) => raw,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        let id = self
            .tool_call_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(ToolCallRequest::generate_id);
        ToolCallRequest::new(id, self.tool_name, arguments)
    }
}

/// GET /tools - every declaration, enabled or not
pub async fn list_tools_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let declarations = state.registry.declarations();
    Json(json!({ "tools": declarations.as_slice() }))
}

/// POST /tools - replace the declaration set
pub async fn save_tools_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>> {
    let request: SaveToolsRequest = parse_json(&body)?;
    let tools = request
        .tools
        .ok_or_else(|| GatewayError::InvalidRequest("tools is required".to_string()))?;

    state
        .registry
        .save_declarations(state.store.as_ref(), tools)
        .await?;
    Ok(Json(json!({ "status": "success" })))
}

/// POST /tools/process_tool_use - run one tool outside a chat turn
pub async fn process_tool_use_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Message>> {
    let request: ToolUseRequest = parse_json(&body)?;
    let call = request.into_call();
    let result = state.orchestrator.invoker().invoke(&call).await;
    Ok(Json(result.into_message()))
}
