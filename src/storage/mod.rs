// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Document storage
//!
//! A small key-value document store grouped into collections. Threads,
//! model profiles and the tool declaration set all live here.

pub mod filesystem;
pub mod memory;

pub use filesystem::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{GatewayError, Result};

/// Collection holding conversation threads
pub const THREADS: &str = "threads";
/// Collection holding model profiles
pub const MODELS: &str = "models";
/// Collection holding the tool declaration set
pub const TOOLS: &str = "tools";

/// Trait for document storage backends
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or replace a document
    async fn save(&self, collection: &str, id: &str, document: &Value) -> Result<()>;

    /// Load a document, `None` if absent
    async fn load(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Delete a document, returning whether it existed
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// All documents of a collection, ordered by id
    async fn list(&self, collection: &str) -> Result<Vec<Value>>;
}

/// Reject ids that could escape the collection or collide with temp files
pub fn validate_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if valid {
        Ok(())
    } else {
        Err(GatewayError::InvalidRequest(format!(
            "invalid document id '{}'",
            id
        )))
    }
}
