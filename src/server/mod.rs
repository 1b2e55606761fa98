// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! HTTP server
//!
//! The axum router over [`AppState`] and the listener loop.

pub mod error;
pub mod handlers;
pub mod state;

pub use state::AppState;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::Result;
use handlers::{chat, health, models, threads, tools};

/// Build the gateway router
pub fn create_router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/chat", post(chat::chat_handler))
        .route(
            "/tools",
            get(tools::list_tools_handler).post(tools::save_tools_handler),
        )
        .route(
            "/tools/process_tool_use",
            post(tools::process_tool_use_handler),
        )
        .route("/models", get(models::list_models_handler))
        .route(
            "/models/:id",
            get(models::get_model_handler)
                .put(models::put_model_handler)
                .delete(models::delete_model_handler),
        )
        .route("/threads", get(threads::list_threads_handler))
        .route(
            "/threads/:id",
            get(threads::get_thread_handler)
                .put(threads::put_thread_handler)
                .delete(threads::delete_thread_handler),
        )
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(target: "aide.server", origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Serve until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(target: "aide.server", %addr, "gateway listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!(target: "aide.server", "gateway stopped");
    Ok(())
}
