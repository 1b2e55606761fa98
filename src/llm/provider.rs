// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Upstream client trait and related types
//!
//! Defines the transport boundary to an OpenAI-compatible chat-completion
//! endpoint. The streaming call hands back raw provider bytes; framing is
//! interpreted by the stream relay, not here.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::error::Result;
use crate::llm::configuration::{Configuration, SamplingParams, ToolChoice};
use crate::llm::message::Message;
use crate::tools::{FunctionSpec, ToolDeclaration};

/// Raw byte chunks of a streaming upstream response
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Transport to the LLM provider
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Provider name for logging (e.g., "openrouter")
    fn name(&self) -> &str;

    /// Single-shot completion. Sends `stream: false` regardless of `params.stream`.
    async fn complete(&self, params: ChatParams) -> Result<CompletionResponse>;

    /// Streaming completion. Sends `stream: true` and returns the raw body.
    async fn complete_stream(&self, params: ChatParams) -> Result<ByteStream>;
}

/// Request body for the chat-completion endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatParams {
    pub model: String,

    pub messages: Vec<Message>,

    #[serde(flatten)]
    pub sampling: SamplingParams,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<FunctionTool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    pub stream: bool,
}

/// Tool entry in the upstream request: only `type` and `function` are sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionSpec,
}

impl From<&ToolDeclaration> for FunctionTool {
    fn from(declaration: &ToolDeclaration) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: declaration.function.clone(),
        }
    }
}

impl ChatParams {
    /// Build upstream parameters from a client configuration.
    ///
    /// Unset optional fields stay unset. `tool_choice` defaults to `auto` when
    /// tools are offered and is dropped when none are. `stream` starts false.
    pub fn from_configuration(
        model: impl Into<String>,
        configuration: &Configuration,
        messages: Vec<Message>,
        tools: &[ToolDeclaration],
    ) -> Self {
        let tools: Vec<FunctionTool> = tools.iter().map(FunctionTool::from).collect();
        let tool_choice = if tools.is_empty() {
            None
        } else {
            Some(configuration.tool_choice.clone().unwrap_or_default())
        };

        Self {
            model: model.into(),
            messages,
            sampling: configuration.sampling.clone(),
            tools,
            tool_choice,
            stream: false,
        }
    }

    /// Copy of these parameters with the stream flag set
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// Non-streaming completion response
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub choices: Vec<Choice>,

    #[serde(default)]
    pub usage: Option<Usage>,
}

/// A single completion choice
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,

    pub message: Message,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl CompletionResponse {
    /// The first choice's message, if any
    pub fn first_message(&self) -> Option<&Message> {
        self.choices.first().map(|c| &c.message)
    }

    /// Consume the response and return the first choice's message
    pub fn into_first_message(self) -> Option<Message> {
        self.choices.into_iter().next().map(|c| c.message)
    }
}
