// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;

use aide_gateway::cli::{Cli, Commands, ServeArgs};
use aide_gateway::config::Settings;
use aide_gateway::error::{GatewayError, Result};
use aide_gateway::server::{self, AppState};
use aide_gateway::storage::{DocumentStore, FileStore, MemoryStore};
use aide_gateway::tools::ToolRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    let mut directives = vec!["aide=info"];
    // `-v` turns on turn-level diagnostics; `RUST_LOG` still applies
    if cli.verbose > 0 {
        directives.extend([
            "aide.chat=debug",
            "aide.tools=debug",
            "aide.llm=debug",
            "tower_http=debug",
        ]);
    }
    if cli.verbose > 1 {
        directives.push("aide=trace");
    }
    for directive in directives {
        if let Ok(parsed) = directive.parse() {
            env_filter = env_filter.add_directive(parsed);
        }
    }
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    settings.validate()?;

    match cli.command {
        None => run_serve(ServeArgs::default(), settings).await,
        Some(Commands::Serve(args)) => run_serve(args, settings).await,
        Some(Commands::Tools) => run_tools(settings).await,
    }
}

async fn run_serve(args: ServeArgs, settings: Settings) -> Result<()> {
    let store: Arc<dyn DocumentStore> = if args.ephemeral {
        tracing::warn!(target: "aide.server", "ephemeral mode, documents are kept in memory");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FileStore::new(settings.data_dir()))
    };

    let state = Arc::new(AppState::from_settings(&settings, store).await?);
    let router = server::create_router(state, &settings.allowed_origins());

    let bind = args.bind.unwrap_or_else(|| settings.server.bind.clone());
    let listener = TcpListener::bind(&bind)
        .await
        .map_err(|e| GatewayError::Config(format!("Failed to bind {}: {}", bind, e)))?;

    server::serve(listener, router, shutdown_signal()).await
}

async fn run_tools(settings: Settings) -> Result<()> {
    let store = FileStore::new(settings.data_dir());
    let registry = ToolRegistry::with_builtins(&settings.tools);
    registry.load_from_store(&store).await?;

    let enabled = registry.list_enabled();
    println!("{}", serde_json::to_string_pretty(&enabled)?);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(target: "aide.server", error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!(target: "aide.server", "shutdown requested");
}
