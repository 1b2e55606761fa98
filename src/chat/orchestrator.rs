// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat orchestrator
//!
//! Drives one chat turn through the two-phase protocol: a non-streaming
//! request to detect tool calls, one round of tool execution, then a streaming
//! re-request whose body is handed to the relay.

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;

use crate::chat::relay::{RelayEvent, StreamRelay};
use crate::error::{ApiError, GatewayError, Result};
use crate::llm::configuration::Configuration;
use crate::llm::message::{Message, ToolCallRequest};
use crate::llm::provider::{ChatParams, UpstreamClient};
use crate::tools::{ToolDeclaration, ToolExecutionMode, ToolInvoker, ToolRegistry, ToolResult};

/// Client-facing event stream of a turn
pub type RelayStream = Pin<Box<dyn Stream<Item = RelayEvent> + Send>>;

/// Body of `POST /chat`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(default)]
    pub configuration: Configuration,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>, configuration: Configuration) -> Self {
        Self {
            messages,
            configuration,
        }
    }
}

/// Stages of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Init,
    AwaitingInitialResponse,
    NoToolCalls,
    ToolCallsDetected,
    ExecutingTools,
    AwaitingFinalStream,
    Streaming,
    Done,
    Failed,
}

/// A turn that reached the streaming stage
pub struct ChatTurn {
    /// Message sequence sent with the streaming request
    pub messages: Vec<Message>,
    /// Tool results, in tool-call order
    pub tool_results: Vec<ToolResult>,
    /// States visited before streaming began
    pub trace: Vec<TurnState>,
    /// Relayed events; ends with `Done` or `Error`
    pub events: RelayStream,
}

/// Runs chat turns against an upstream client and a tool registry
pub struct ChatOrchestrator {
    upstream: Arc<dyn UpstreamClient>,
    invoker: ToolInvoker,
    execution: ToolExecutionMode,
}

impl ChatOrchestrator {
    pub fn new(upstream: Arc<dyn UpstreamClient>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            upstream,
            invoker: ToolInvoker::new(registry),
            execution: ToolExecutionMode::default(),
        }
    }

    /// Set how sibling tool calls are executed
    pub fn with_execution_mode(mut self, execution: ToolExecutionMode) -> Self {
        self.execution = execution;
        self
    }

    pub fn execution_mode(&self) -> ToolExecutionMode {
        self.execution
    }

    /// The invoker used for tool rounds
    pub fn invoker(&self) -> &ToolInvoker {
        &self.invoker
    }

    /// Tools offered this turn: the registry's enabled set, narrowed by
    /// function name when the caller lists tools explicitly
    fn tools_for(&self, configuration: &Configuration) -> Vec<ToolDeclaration> {
        let enabled = self.invoker.registry().list_enabled();
        match &configuration.tools {
            None => enabled,
            Some(requested) => enabled
                .into_iter()
                .filter(|d| {
                    requested
                        .iter()
                        .any(|r| r.dispatch_key() == d.dispatch_key())
                })
                .collect(),
        }
    }

    /// Validate a request and build the first-call parameters (`stream: false`)
    pub fn build_params(&self, request: &ChatRequest) -> Result<ChatParams> {
        if request.messages.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "messages must not be empty".to_string(),
            ));
        }
        let model = request.configuration.model_id().ok_or_else(|| {
            GatewayError::InvalidRequest("configuration.model is required".to_string())
        })?;

        let tools = self.tools_for(&request.configuration);
        Ok(ChatParams::from_configuration(
            model,
            &request.configuration,
            request.messages.clone(),
            &tools,
        ))
    }

    /// Run a turn up to the start of streaming.
    ///
    /// Errors returned here happened before any event was produced; once
    /// this returns, failures arrive in-band as a terminal `Error` event.
    pub async fn start_turn(&self, request: ChatRequest) -> Result<ChatTurn> {
        let mut trace = vec![TurnState::Init];

        match self.run_to_stream(request, &mut trace).await {
            Ok(turn) => Ok(turn),
            Err(err) => {
                tracing::warn!(
                    target: "aide.chat.orchestrator",
                    state = ?TurnState::Failed,
                    after = ?trace.last(),
                    status = err.status_code(),
                    error = %err,
                    "chat turn failed before streaming"
                );
                Err(err)
            }
        }
    }

    async fn run_to_stream(
        &self,
        request: ChatRequest,
        trace: &mut Vec<TurnState>,
    ) -> Result<ChatTurn> {
        let mut params = self.build_params(&request)?;
        tracing::info!(
            target: "aide.chat.orchestrator",
            model = %params.model,
            messages = params.messages.len(),
            tools = params.tools.len(),
            "starting chat turn"
        );

        trace.push(TurnState::AwaitingInitialResponse);
        let response = self.upstream.complete(params.clone()).await?;
        let mut assistant = response.into_first_message().ok_or_else(|| {
            GatewayError::Api(ApiError::InvalidResponse(
                "No choices in response".to_string(),
            ))
        })?;

        let mut tool_results = Vec::new();
        if assistant.has_tool_calls() {
            trace.push(TurnState::ToolCallsDetected);
            assign_missing_call_ids(&mut assistant);
            let calls = assistant.tool_calls().to_vec();
            tracing::info!(
                target: "aide.chat.orchestrator",
                count = calls.len(),
                mode = ?self.execution,
                "executing tool calls"
            );

            // The assistant message stays in context even with null content
            params.messages.push(assistant);

            trace.push(TurnState::ExecutingTools);
            tool_results = self.invoker.invoke_all(&calls, self.execution).await;
            params
                .messages
                .extend(tool_results.iter().cloned().map(ToolResult::into_message));
        } else {
            trace.push(TurnState::NoToolCalls);
            tracing::debug!(target: "aide.chat.orchestrator", "no tool calls, streaming directly");
        }

        trace.push(TurnState::AwaitingFinalStream);
        let params = params.with_stream(true);
        let messages = params.messages.clone();
        let body = self.upstream.complete_stream(params).await?;

        trace.push(TurnState::Streaming);
        let events = StreamRelay::relay(body).inspect(|event| match event {
            RelayEvent::Done => tracing::info!(
                target: "aide.chat.orchestrator",
                state = ?TurnState::Done,
                "chat turn finished"
            ),
            RelayEvent::Error { message } => tracing::warn!(
                target: "aide.chat.orchestrator",
                state = ?TurnState::Failed,
                error = %message,
                "chat turn truncated"
            ),
            RelayEvent::Chunk(_) => {}
        });

        Ok(ChatTurn {
            messages,
            tool_results,
            trace: trace.clone(),
            events: Box::pin(events),
        })
    }
}

/// Give every id-less tool call a generated id, so each tool result can
/// still be matched to its call
fn assign_missing_call_ids(assistant: &mut Message) {
    let Some(calls) = assistant.tool_calls.as_mut() else {
        return;
    };
    for call in calls.iter_mut().filter(|c| c.id.trim().is_empty()) {
        call.id = ToolCallRequest::generate_id();
        tracing::debug!(
            target: "aide.chat.orchestrator",
            tool = %call.function.name,
            call_id = %call.id,
            "generated id for tool call without one"
        );
    }
}
