// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Thread endpoints. Threads are opaque JSON objects keyed by id.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{GatewayError, Result};
use crate::server::error::parse_json;
use crate::server::state::AppState;
use crate::storage::{self, validate_id};

/// GET /threads
pub async fn list_threads_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let threads = state.store.list(storage::THREADS).await?;
    Ok(Json(json!({ "threads": threads })))
}

/// GET /threads/:id
pub async fn get_thread_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    validate_id(&id)?;
    state
        .store
        .load(storage::THREADS, &id)
        .await?
        .map(Json)
        .ok_or_else(|| GatewayError::NotFound(format!("thread '{}'", id)))
}

/// PUT /threads/:id
pub async fn put_thread_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>> {
    validate_id(&id)?;
    let mut thread: Value = parse_json(&body)?;
    let fields = thread
        .as_object_mut()
        .ok_or_else(|| GatewayError::InvalidRequest("thread must be a JSON object".to_string()))?;

    match fields.get("id") {
        None | Some(Value::Null) => {}
        Some(Value::String(body_id)) if body_id == &id => {}
        Some(other) => {
            return Err(GatewayError::InvalidRequest(format!(
                "body id {} does not match path id '{}'",
                other, id
            )))
        }
    }
    fields.insert("id".to_string(), Value::String(id.clone()));
    fields.insert(
        "updated_at".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );

    state.store.save(storage::THREADS, &id, &thread).await?;
    tracing::debug!(target: "aide.server", thread = %id, "thread saved");
    Ok(Json(thread))
}

/// DELETE /threads/:id
pub async fn delete_thread_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    validate_id(&id)?;
    if !state.store.delete(storage::THREADS, &id).await? {
        return Err(GatewayError::NotFound(format!("thread '{}'", id)));
    }
    Ok(Json(json!({ "status": "success" })))
}
