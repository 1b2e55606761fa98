// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Model profile endpoints
//!
//! A profile is a named `Configuration` preset stored in the models
//! collection.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{GatewayError, Result};
use crate::llm::configuration::Configuration;
use crate::server::error::parse_json;
use crate::server::state::AppState;
use crate::storage::{self, validate_id};

/// A stored model preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, alias = "baseModel", skip_serializing_if = "Option::is_none")]
    pub base_model: Option<String>,

    #[serde(default, alias = "systemPrompt", skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    #[serde(default)]
    pub parameters: Configuration,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn decode(document: Value) -> Result<ModelProfile> {
    serde_json::from_value(document)
        .map_err(|e| GatewayError::Storage(format!("Failed to parse stored model: {}", e)))
}

/// GET /models
pub async fn list_models_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let models = state
        .store
        .list(storage::MODELS)
        .await?
        .into_iter()
        .map(decode)
        .collect::<Result<Vec<_>>>()?;
    Ok(Json(json!({ "models": models })))
}

/// GET /models/:id
pub async fn get_model_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ModelProfile>> {
    validate_id(&id)?;
    let document = state
        .store
        .load(storage::MODELS, &id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("model '{}'", id)))?;
    Ok(Json(decode(document)?))
}

/// PUT /models/:id
pub async fn put_model_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ModelProfile>> {
    validate_id(&id)?;
    let mut profile: ModelProfile = parse_json(&body)?;
    if profile.id != id {
        return Err(GatewayError::InvalidRequest(format!(
            "body id '{}' does not match path id '{}'",
            profile.id, id
        )));
    }

    profile.updated_at = Some(Utc::now());
    state
        .store
        .save(storage::MODELS, &id, &serde_json::to_value(&profile)?)
        .await?;
    tracing::info!(target: "aide.server", model = %id, "model profile saved");
    Ok(Json(profile))
}

/// DELETE /models/:id
pub async fn delete_model_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    validate_id(&id)?;
    if !state.store.delete(storage::MODELS, &id).await? {
        return Err(GatewayError::NotFound(format!("model '{}'", id)));
    }
    Ok(Json(json!({ "status": "success" })))
}
