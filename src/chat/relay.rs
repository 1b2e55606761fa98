// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Stream relay
//!
//! Reads the provider's SSE body line by line and re-emits each frame in the
//! client-facing envelope. The relay always ends with exactly one terminal
//! event: `Done` on the provider's sentinel, `Error` otherwise.

use async_stream::stream;
use futures::{Stream, StreamExt};
use serde_json::Value;

use crate::llm::provider::ByteStream;

const DONE_SENTINEL: &str = "[DONE]";

/// One event sent to the client
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// A provider chunk, forwarded as-is
    Chunk(Value),
    /// Terminal: the response is truncated
    Error { message: String },
    /// Terminal: the response is complete
    Done,
}

impl RelayEvent {
    /// Payload of the SSE `data:` field
    pub fn to_sse_data(&self) -> String {
        match self {
            RelayEvent::Chunk(value) => value.to_string(),
            RelayEvent::Error { message } => serde_json::json!({
                "error": { "message": message, "type": "stream_error" }
            })
            .to_string(),
            RelayEvent::Done => DONE_SENTINEL.to_string(),
        }
    }

    /// The complete SSE frame, `data: <payload>\n\n`
    pub fn to_frame(&self) -> String {
        format!("data: {}\n\n", self.to_sse_data())
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RelayEvent::Chunk(_))
    }
}

/// What a single upstream line means
#[derive(Debug, PartialEq)]
enum Frame {
    Skip,
    Chunk(Value),
    Error(String),
    Done,
    Malformed(String),
}

fn parse_line(raw: &[u8]) -> Frame {
    let Ok(line) = std::str::from_utf8(raw) else {
        return Frame::Malformed("invalid UTF-8".to_string());
    };
    let line = line.trim();

    if line.is_empty() || line.starts_with(':') {
        return Frame::Skip;
    }

    let Some(payload) = line.strip_prefix("data:") else {
        return if ["event:", "id:", "retry:"].iter().any(|f| line.starts_with(f)) {
            Frame::Skip
        } else {
            Frame::Malformed(format!("unexpected line: {}", line))
        };
    };
    let payload = payload.trim_start();

    if payload == DONE_SENTINEL {
        return Frame::Done;
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(value) => match value.get("error") {
            Some(error) if !error.is_null() => Frame::Error(error_message(error)),
            _ => Frame::Chunk(value),
        },
        Err(e) => Frame::Malformed(e.to_string()),
    }
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(fields) => fields
            .get("message")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

/// Relays an upstream SSE body to the client
pub struct StreamRelay;

impl StreamRelay {
    /// Lazily translate the upstream body into client events.
    ///
    /// Dropping the returned stream drops the upstream connection.
    pub fn relay(upstream: ByteStream) -> impl Stream<Item = RelayEvent> + Send {
        stream! {
            let mut upstream = upstream;
            let mut buffer: Vec<u8> = Vec::new();
            let mut forwarded = 0usize;
            let mut ended = false;

            loop {
                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    match parse_line(&line) {
                        Frame::Skip => {}
                        Frame::Chunk(value) => {
                            forwarded += 1;
                            yield RelayEvent::Chunk(value);
                        }
                        Frame::Malformed(reason) => {
                            tracing::warn!(
                                target: "aide.chat.relay",
                                reason = %reason,
                                "skipping malformed stream frame"
                            );
                        }
                        Frame::Error(message) => {
                            tracing::warn!(
                                target: "aide.chat.relay",
                                error = %message,
                                forwarded,
                                "upstream reported an error mid-stream"
                            );
                            yield RelayEvent::Error { message };
                            return;
                        }
                        Frame::Done => {
                            tracing::debug!(target: "aide.chat.relay", forwarded, "stream complete");
                            yield RelayEvent::Done;
                            return;
                        }
                    }
                }

                if ended {
                    tracing::warn!(
                        target: "aide.chat.relay",
                        forwarded,
                        "upstream closed without completion sentinel"
                    );
                    yield RelayEvent::Error {
                        message: "upstream stream ended before completion".to_string(),
                    };
                    return;
                }

                match upstream.next().await {
                    Some(Ok(bytes)) => buffer.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        tracing::warn!(
                            target: "aide.chat.relay",
                            error = %e,
                            forwarded,
                            "upstream stream failed"
                        );
                        yield RelayEvent::Error { message: e.to_string() };
                        return;
                    }
                    None => {
                        ended = true;
                        // Flush a final line that has no trailing newline
                        if !buffer.is_empty() {
                            buffer.push(b'\n');
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, GatewayError, Result};
    use bytes::Bytes;
    use futures::stream;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    fn upstream(chunks: &[&str]) -> ByteStream {
        let items: Vec<Result<Bytes>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from(c.to_string())))
            .collect();
        Box::pin(stream::iter(items))
    }

    async fn collect(upstream: ByteStream) -> Vec<RelayEvent> {
        StreamRelay::relay(upstream).collect().await
    }

    fn delta(text: &str) -> String {
        format!(
            "data: {}\n\n",
            json!({"choices": [{"index": 0, "delta": {"content": text}}]})
        )
    }

    fn content(event: &RelayEvent) -> &str {
        match event {
            RelayEvent::Chunk(v) => v["choices"][0]["delta"]["content"].as_str().unwrap(),
            other => panic!("expected chunk, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forwards_chunks_then_done() {
        let events = collect(upstream(&[&delta("Hel"), &delta("lo"), "data: [DONE]\n\n"])).await;

        assert_eq!(events.len(), 3);
        assert_eq!(content(&events[0]), "Hel");
        assert_eq!(content(&events[1]), "lo");
        assert_eq!(events[2], RelayEvent::Done);
    }

    #[tokio::test]
    async fn test_frames_split_across_reads() {
        let frame = delta("naïve");
        let bytes = frame.as_bytes();
        // Split inside the multi-byte character
        let cut = frame.find('ï').unwrap() + 1;
        let items: Vec<Result<Bytes>> = vec![
            Ok(Bytes::copy_from_slice(&bytes[..cut])),
            Ok(Bytes::copy_from_slice(&bytes[cut..])),
            Ok(Bytes::from("data: [DO")),
            Ok(Bytes::from("NE]\n\n")),
        ];

        let events = collect(Box::pin(stream::iter(items))).await;
        assert_eq!(content(&events[0]), "naïve");
        assert_eq!(events[1], RelayEvent::Done);
    }

    #[tokio::test]
    async fn test_comments_and_crlf_are_handled() {
        let chunk = delta("x").replace('\n', "\r\n");
        let events = collect(upstream(&[
            ": OPENROUTER PROCESSING\n\n",
            "event: message\n",
            &chunk,
            "data: [DONE]\r\n\r\n",
        ]))
        .await;

        assert_eq!(events.len(), 2);
        assert_eq!(content(&events[0]), "x");
        assert_eq!(events[1], RelayEvent::Done);
    }

    #[tokio::test]
    async fn test_malformed_frame_is_skipped() {
        let events = collect(upstream(&[
            &delta("a"),
            "data: {not json\n\n",
            "garbage line\n",
            &delta("b"),
            "data: [DONE]\n\n",
        ]))
        .await;

        assert_eq!(events.len(), 3);
        assert_eq!(content(&events[0]), "a");
        assert_eq!(content(&events[1]), "b");
        assert_eq!(events[2], RelayEvent::Done);
    }

    #[tokio::test]
    async fn test_error_frame_stops_relay() {
        let error = json!({"error": {"code": 502, "message": "provider went away"}});
        let events = collect(upstream(&[
            &delta("partial"),
            &format!("data: {}\n\n", error),
            &delta("never"),
            "data: [DONE]\n\n",
        ]))
        .await;

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            RelayEvent::Error {
                message: "provider went away".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_eof_without_done_is_truncation() {
        let events = collect(upstream(&[&delta("partial")])).await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], RelayEvent::Error { .. }));
    }

    #[tokio::test]
    async fn test_done_without_trailing_newline() {
        let events = collect(upstream(&[&delta("a"), "data: [DONE]"])).await;
        assert_eq!(events.last(), Some(&RelayEvent::Done));
    }

    #[tokio::test]
    async fn test_transport_error_is_terminal() {
        let items: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from(delta("a"))),
            Err(GatewayError::Api(ApiError::StreamError("reset".to_string()))),
            Ok(Bytes::from(delta("b"))),
        ];
        let events = collect(Box::pin(stream::iter(items))).await;

        assert_eq!(events.len(), 2);
        match &events[1] {
            RelayEvent::Error { message } => assert!(message.contains("reset")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_event_framing() {
        assert_eq!(RelayEvent::Done.to_frame(), "data: [DONE]\n\n");
        assert_eq!(
            RelayEvent::Chunk(json!({"a": 1})).to_frame(),
            "data: {\"a\":1}\n\n"
        );

        let error = RelayEvent::Error {
            message: "boom".to_string(),
        };
        let data: Value = serde_json::from_str(&error.to_sse_data()).unwrap();
        assert_eq!(data["error"]["message"], "boom");
        assert!(error.is_terminal());
        assert!(!RelayEvent::Chunk(json!({})).is_terminal());
    }

    #[test]
    fn test_parse_line_error_shapes() {
        assert_eq!(
            parse_line(br#"data: {"error": "plain"}"#),
            Frame::Error("plain".to_string())
        );
        assert!(matches!(
            parse_line(br#"data: {"error": null, "choices": []}"#),
            Frame::Chunk(_)
        ));
        assert_eq!(parse_line(b"data:[DONE]"), Frame::Done);
    }

    #[tokio::test]
    async fn test_dropping_relay_drops_upstream() {
        let dropped = Arc::new(AtomicBool::new(false));
        let guard = DropFlag(Arc::clone(&dropped));
        let first_chunk = delta("Hel");
        let upstream: ByteStream = Box::pin(async_stream::stream! {
            let _guard = guard;
            yield Ok::<Bytes, GatewayError>(Bytes::from(first_chunk));
            futures::future::pending::<()>().await;
        });

        let mut relay = Box::pin(StreamRelay::relay(upstream));
        let first = relay.next().await.unwrap();
        assert_eq!(content(&first), "Hel");
        assert!(!dropped.load(Ordering::SeqCst));

        drop(relay);
        assert!(dropped.load(Ordering::SeqCst));
    }
}
