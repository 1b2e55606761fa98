// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Upstream client implementations

pub(crate) mod common;
pub mod openrouter;

pub use openrouter::OpenRouterClient;
