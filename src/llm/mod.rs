// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! LLM module for the gateway
//!
//! Message and configuration types plus the transport to the upstream provider.

pub mod configuration;
pub mod message;
pub mod mock_provider;
pub mod provider;
pub mod providers;

pub use configuration::*;
pub use message::*;
pub use provider::*;
