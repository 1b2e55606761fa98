// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat endpoint

use axum::{
    body::Bytes,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;

use crate::chat::ChatRequest;
use crate::error::Result;
use crate::server::error::parse_json;
use crate::server::state::AppState;

/// POST /chat - run a chat turn and stream the answer as SSE.
///
/// Failures before the stream starts are plain JSON errors; later failures
/// arrive as a final error event.
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let request: ChatRequest = parse_json(&body)?;
    let turn = state.orchestrator.start_turn(request).await?;

    let events = turn
        .events
        .map(|event| Ok(Event::default().data(event.to_sse_data())));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
