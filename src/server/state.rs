// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Application state shared by all handlers

use std::sync::Arc;

use crate::chat::ChatOrchestrator;
use crate::config::Settings;
use crate::error::Result;
use crate::llm::providers::OpenRouterClient;
use crate::storage::DocumentStore;
use crate::tools::ToolRegistry;

/// Application state shared across all handlers
pub struct AppState {
    /// Runs chat turns
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Tool handlers and the declaration set
    pub registry: Arc<ToolRegistry>,
    /// Threads, model profiles and stored tools
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<ChatOrchestrator>,
        registry: Arc<ToolRegistry>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            orchestrator,
            registry,
            store,
        }
    }

    /// Wire up the OpenRouter client, built-in tools and stored declarations
    pub async fn from_settings(settings: &Settings, store: Arc<dyn DocumentStore>) -> Result<Self> {
        let registry = ToolRegistry::with_builtins(&settings.tools);
        registry.load_from_store(store.as_ref()).await?;
        let registry = Arc::new(registry);

        let upstream = Arc::new(OpenRouterClient::from_settings(&settings.upstream)?);
        tracing::info!(
            target: "aide.server",
            upstream = %upstream.endpoint(),
            tools = registry.list_enabled().len(),
            execution = ?settings.tools.execution,
            "gateway state initialised"
        );

        let orchestrator = ChatOrchestrator::new(upstream, Arc::clone(&registry))
            .with_execution_mode(settings.tools.execution);

        Ok(Self::new(Arc::new(orchestrator), registry, store))
    }
}
