// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Mock upstream client for testing
//!
//! Scripted implementation of `UpstreamClient` that records every request
//! and never touches the network.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{ApiError, GatewayError, Result};
use crate::llm::message::{Message, ToolCallRequest};
use crate::llm::provider::{
    ByteStream, ChatParams, Choice, CompletionResponse, UpstreamClient, Usage,
};

/// A mock upstream client for testing
#[derive(Clone)]
pub struct MockUpstream {
    /// Replies to `complete`, consumed in order; the last one repeats
    replies: Arc<Mutex<Vec<MockReply>>>,
    /// Chunks yielded by `complete_stream`
    stream_chunks: Arc<Mutex<Vec<MockChunk>>>,
    /// Failure returned by `complete_stream` instead of a body
    stream_failure: Arc<Mutex<Option<(u16, String)>>>,
    call_count: Arc<AtomicUsize>,
    stream_call_count: Arc<AtomicUsize>,
    recorded_params: Arc<Mutex<Vec<ChatParams>>>,
}

/// A scripted reply to a non-streaming call
#[derive(Clone, Debug)]
pub enum MockReply {
    /// Successful response carrying this assistant message
    Message(Message),
    /// Response with an empty `choices` list
    NoChoices,
    /// Non-2xx upstream status
    Failure { status: u16, message: String },
}

/// A scripted piece of the streaming body
#[derive(Clone, Debug)]
pub enum MockChunk {
    /// Raw bytes, exactly as the provider would send them
    Data(String),
    /// Transport failure at this point of the stream
    Error(String),
}

impl Default for MockUpstream {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Mock upstream lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// An SSE `data:` frame carrying one content delta
pub fn delta_frame(text: &str) -> String {
    let chunk = serde_json::json!({
        "id": "gen-mock",
        "object": "chat.completion.chunk",
        "choices": [{"index": 0, "delta": {"content": text}, "finish_reason": null}]
    });
    format!("data: {}\n\n", chunk)
}

/// The provider's completion sentinel frame
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

impl MockUpstream {
    /// Create a mock that answers with plain text and streams it back
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(vec![MockReply::Message(Message::assistant(
                "Mock response",
            ))])),
            stream_chunks: Arc::new(Mutex::new(vec![
                MockChunk::Data(delta_frame("Mock response")),
                MockChunk::Data(DONE_FRAME.to_string()),
            ])),
            stream_failure: Arc::new(Mutex::new(None)),
            call_count: Arc::new(AtomicUsize::new(0)),
            stream_call_count: Arc::new(AtomicUsize::new(0)),
            recorded_params: Arc::new(Mutex::new(vec![])),
        }
    }

    /// Replace the non-streaming replies
    pub fn with_replies(self, replies: Vec<MockReply>) -> Self {
        *lock(&self.replies) = replies;
        self
    }

    /// Answer the first call with a plain assistant message
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.with_replies(vec![MockReply::Message(Message::assistant(text))])
    }

    /// Answer the first call with tool calls and null content
    pub fn with_tool_calls(self, calls: Vec<ToolCallRequest>) -> Self {
        self.with_replies(vec![MockReply::Message(Message::assistant_tool_calls(
            None, calls,
        ))])
    }

    /// Fail the first call with an upstream status
    pub fn with_failure(self, status: u16, message: impl Into<String>) -> Self {
        self.with_replies(vec![MockReply::Failure {
            status,
            message: message.into(),
        }])
    }

    /// Replace the streaming body with raw chunks
    pub fn with_stream_chunks(self, chunks: Vec<MockChunk>) -> Self {
        *lock(&self.stream_chunks) = chunks;
        self
    }

    /// Stream each piece as a content delta, then `[DONE]`
    pub fn with_stream_text(self, pieces: &[&str]) -> Self {
        let mut chunks: Vec<MockChunk> = pieces
            .iter()
            .map(|p| MockChunk::Data(delta_frame(p)))
            .collect();
        chunks.push(MockChunk::Data(DONE_FRAME.to_string()));
        self.with_stream_chunks(chunks)
    }

    /// Fail the streaming call with an upstream status
    pub fn with_stream_failure(self, status: u16, message: impl Into<String>) -> Self {
        *lock(&self.stream_failure) = Some((status, message.into()));
        self
    }

    /// Number of non-streaming calls
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Number of streaming calls
    pub fn stream_call_count(&self) -> usize {
        self.stream_call_count.load(Ordering::SeqCst)
    }

    /// All recorded params, in call order, as sent on the wire
    pub fn recorded_params(&self) -> Vec<ChatParams> {
        lock(&self.recorded_params).clone()
    }

    /// The last params sent
    pub fn last_params(&self) -> Option<ChatParams> {
        lock(&self.recorded_params).last().cloned()
    }

    fn next_reply(&self) -> MockReply {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        let replies = lock(&self.replies);
        if replies.is_empty() {
            MockReply::Message(Message::assistant("Mock response"))
        } else {
            replies[count.min(replies.len() - 1)].clone()
        }
    }

    fn failure(status: u16, message: String) -> GatewayError {
        match status {
            401 => GatewayError::Api(ApiError::AuthenticationFailed(message)),
            _ => GatewayError::Api(ApiError::ServerError { status, message }),
        }
    }
}

#[async_trait]
impl UpstreamClient for MockUpstream {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, params: ChatParams) -> Result<CompletionResponse> {
        let params = params.with_stream(false);
        let model = params.model.clone();
        lock(&self.recorded_params).push(params);

        let choices = match self.next_reply() {
            MockReply::Message(message) => vec![Choice {
                index: 0,
                finish_reason: Some(if message.has_tool_calls() {
                    "tool_calls".to_string()
                } else {
                    "stop".to_string()
                }),
                message,
            }],
            MockReply::NoChoices => vec![],
            MockReply::Failure { status, message } => {
                return Err(Self::failure(status, message))
            }
        };

        Ok(CompletionResponse {
            id: Some(format!("gen-{}", uuid::Uuid::new_v4().simple())),
            model: Some(model),
            choices,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            }),
        })
    }

    async fn complete_stream(&self, params: ChatParams) -> Result<ByteStream> {
        self.stream_call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.recorded_params).push(params.with_stream(true));

        if let Some((status, message)) = lock(&self.stream_failure).clone() {
            return Err(Self::failure(status, message));
        }

        let items: Vec<Result<Bytes>> = lock(&self.stream_chunks)
            .iter()
            .map(|chunk| match chunk {
                MockChunk::Data(data) => Ok(Bytes::from(data.clone())),
                MockChunk::Error(message) => {
                    Err(GatewayError::Api(ApiError::StreamError(message.clone())))
                }
            })
            .collect();

        Ok(Box::pin(stream::iter(items)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::configuration::Configuration;
    use futures::StreamExt;

    fn params() -> ChatParams {
        ChatParams::from_configuration(
            "m1",
            &Configuration::for_model("m1"),
            vec![Message::user("hi")],
            &[],
        )
    }

    #[test]
    fn test_mock_upstream_creation() {
        let upstream = MockUpstream::new();
        assert_eq!(upstream.name(), "mock");
        assert_eq!(upstream.call_count(), 0);
        assert_eq!(upstream.stream_call_count(), 0);
    }

    #[tokio::test]
    async fn test_complete_records_params_without_stream() {
        let upstream = MockUpstream::new().with_reply("Hello");
        let response = upstream.complete(params().with_stream(true)).await.unwrap();

        assert_eq!(
            response.first_message().unwrap().text(),
            Some("Hello")
        );
        assert_eq!(upstream.call_count(), 1);
        assert!(!upstream.last_params().unwrap().stream);
    }

    #[tokio::test]
    async fn test_tool_call_reply() {
        let upstream = MockUpstream::new()
            .with_tool_calls(vec![ToolCallRequest::new("call_1", "calculate", "{}")]);
        let response = upstream.complete(params()).await.unwrap();

        assert_eq!(response.choices[0].finish_reason.as_deref(), Some("tool_calls"));
        assert!(response.first_message().unwrap().content.is_none());
        assert!(response.first_message().unwrap().has_tool_calls());
    }

    #[tokio::test]
    async fn test_replies_advance_then_repeat() {
        let upstream = MockUpstream::new().with_replies(vec![
            MockReply::Message(Message::assistant("first")),
            MockReply::Message(Message::assistant("second")),
        ]);

        let mut texts = vec![];
        for _ in 0..3 {
            let response = upstream.complete(params()).await.unwrap();
            texts.push(response.into_first_message().unwrap().text().unwrap().to_string());
        }
        assert_eq!(texts, vec!["first", "second", "second"]);
    }

    #[tokio::test]
    async fn test_failure_reply() {
        let upstream = MockUpstream::new().with_failure(401, "bad key");
        let err = upstream.complete(params()).await.unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[tokio::test]
    async fn test_stream_text() {
        let upstream = MockUpstream::new().with_stream_text(&["Hel", "lo"]);
        let chunks: Vec<Bytes> = upstream
            .complete_stream(params())
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2], Bytes::from(DONE_FRAME));
        assert!(upstream.last_params().unwrap().stream);
        assert_eq!(upstream.stream_call_count(), 1);
    }

    #[tokio::test]
    async fn test_stream_error_chunk() {
        let upstream = MockUpstream::new().with_stream_chunks(vec![
            MockChunk::Data(delta_frame("partial")),
            MockChunk::Error("connection reset".to_string()),
        ]);
        let items: Vec<Result<Bytes>> = upstream
            .complete_stream(params())
            .await
            .unwrap()
            .collect()
            .await;

        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[test]
    fn test_delta_frame_shape() {
        let frame = delta_frame("hi");
        assert!(frame.starts_with("data: {"));
        assert!(frame.ends_with("\n\n"));
        let json: serde_json::Value =
            serde_json::from_str(frame.trim_start_matches("data: ").trim()).unwrap();
        assert_eq!(json["choices"][0]["delta"]["content"], "hi");
    }
}
