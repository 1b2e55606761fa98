// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat turn orchestration
//!
//! The orchestrator runs the first request and tool round; the relay forwards the
//! final streaming response.

pub mod orchestrator;
pub mod relay;

pub use orchestrator::{ChatOrchestrator, ChatRequest, ChatTurn, RelayStream, TurnState};
pub use relay::{RelayEvent, StreamRelay};
