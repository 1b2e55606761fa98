// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Aide gateway - tool-calling chat gateway for OpenAI-compatible providers.
//!
//! A chat turn is a non-streaming request to the provider, at most one round of
//! tool execution, then a streaming re-request relayed to the client as SSE.
//!
//! Architecture highlights:
//! - `chat`: turn orchestration and the stream relay
//! - `llm`: message types, the upstream client trait and the OpenRouter client
//! - `tools`: tool declarations, the registry, the invoker and built-in tools
//! - `storage`: document store for threads, model profiles and tools
//! - `server`: axum router and handlers

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod server;
pub mod storage;
pub mod tools;

pub use error::{GatewayError, Result};
