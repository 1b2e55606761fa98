// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool invocation
//!
//! Turns a model-issued tool call into exactly one tool result message.
//! Every failure is folded into the result; nothing here returns an error.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::ToolRegistry;
use crate::error::ToolError;
use crate::llm::message::{Message, ToolCallRequest};

const INVALID_ARGUMENTS: &str = "invalid arguments JSON";

/// How sibling tool calls within one turn are executed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolExecutionMode {
    /// One after another, in call order
    #[default]
    Sequential,
    /// All at once; results still come back in call order
    Concurrent,
}

/// Output of a single tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Success(Value),
    Error(String),
}

/// Result of a tool call, tied to the call id it answers
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub name: String,
    pub output: ToolOutput,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            output: ToolOutput::Success(value),
        }
    }

    /// Create an error result
    pub fn error(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            output: ToolOutput::Error(error.into()),
        }
    }

    /// Check if this is an error result
    pub fn is_error(&self) -> bool {
        matches!(self.output, ToolOutput::Error(_))
    }

    /// Message content: strings pass through, anything else is JSON-encoded,
    /// errors become `{"error": message}`
    pub fn content(&self) -> String {
        match &self.output {
            ToolOutput::Success(Value::String(text)) => text.clone(),
            ToolOutput::Success(value) => value.to_string(),
            ToolOutput::Error(message) => serde_json::json!({ "error": message }).to_string(),
        }
    }

    /// Convert into the `tool` role message appended to the conversation
    pub fn into_message(self) -> Message {
        let content = self.content();
        Message::tool(self.name, self.tool_call_id, content)
    }
}

/// Resolves and runs tool calls against a registry
#[derive(Clone)]
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
}

impl ToolInvoker {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// The registry calls are dispatched against
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Run one tool call. Never fails.
    pub async fn invoke(&self, call: &ToolCallRequest) -> ToolResult {
        let name = call.function.name.as_str();
        tracing::debug!(
            target: "aide.tools.invoker",
            tool = name,
            call_id = %call.id,
            "invoking tool"
        );

        let result = match self.dispatch(call).await {
            Ok(value) => ToolResult::success(&call.id, name, value),
            Err(err) => {
                tracing::warn!(
                    target: "aide.tools.invoker",
                    tool = name,
                    call_id = %call.id,
                    error = %err,
                    "tool call failed"
                );
                ToolResult::error(&call.id, name, err.to_string())
            }
        };

        tracing::debug!(
            target: "aide.tools.invoker",
            tool = name,
            call_id = %call.id,
            is_error = result.is_error(),
            "tool call finished"
        );
        result
    }

    /// Run a batch of calls. Results are in call order whatever the mode.
    pub async fn invoke_all(
        &self,
        calls: &[ToolCallRequest],
        mode: ToolExecutionMode,
    ) -> Vec<ToolResult> {
        match mode {
            ToolExecutionMode::Sequential => {
                let mut results = Vec::with_capacity(calls.len());
                for call in calls {
                    results.push(self.invoke(call).await);
                }
                results
            }
            ToolExecutionMode::Concurrent => {
                join_all(calls.iter().map(|call| self.invoke(call))).await
            }
        }
    }

    async fn dispatch(&self, call: &ToolCallRequest) -> Result<Value, ToolError> {
        let arguments = parse_arguments(&call.function.arguments)?;
        let handler = self.registry.lookup(&call.function.name)?;

        // Run detached so a dropped turn does not abort a tool mid-flight
        let task = tokio::spawn(async move { handler.call(arguments).await });
        match task.await {
            Ok(result) => result,
            Err(join_err) if join_err.is_panic() => {
                Err(ToolError::Execution("tool panicked".to_string()))
            }
            Err(_) => Err(ToolError::Execution("tool task was cancelled".to_string())),
        }
    }
}

fn parse_arguments(raw: &str) -> Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        _ => Err(ToolError::InvalidArguments(INVALID_ARGUMENTS.to_string())),
    }
}
