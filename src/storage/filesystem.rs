// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Filesystem document store
//!
//! One directory per collection, one pretty-printed JSON file per document.

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

use super::{validate_id, DocumentStore};
use crate::error::{GatewayError, Result};

/// Filesystem-based document store
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Root directory of the store
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.base_path.join(collection)
    }

    fn document_path(&self, collection: &str, id: &str) -> PathBuf {
        self.collection_path(collection).join(format!("{}.json", id))
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn save(&self, collection: &str, id: &str, document: &Value) -> Result<()> {
        validate_id(id)?;

        let dir = self.collection_path(collection);
        tokio::fs::create_dir_all(&dir).await?;

        let json = serde_json::to_string_pretty(document)
            .map_err(|e| GatewayError::Storage(format!("Failed to serialize document: {}", e)))?;

        // Write then rename so readers never see a half-written file. Each
        // write gets its own temp file; the last rename wins.
        let path = self.document_path(collection, id);
        let tmp = dir.join(format!(".{}.{}.tmp", id, uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::debug!(target: "aide.storage", collection, id, "document saved");
        Ok(())
    }

    async fn load(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        validate_id(id)?;

        let path = self.document_path(collection, id);
        if !path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let document = serde_json::from_str(&content).map_err(|e| {
            GatewayError::Storage(format!("Failed to parse {}/{}: {}", collection, id, e))
        })?;

        Ok(Some(document))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        validate_id(id)?;

        let path = self.document_path(collection, id);
        if !path.exists() {
            return Ok(false);
        }

        tokio::fs::remove_file(path).await?;
        tracing::debug!(target: "aide.storage", collection, id, "document deleted");
        Ok(true)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Value>> {
        let dir = self.collection_path(collection);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_document = path.extension().and_then(|e| e.to_str()) == Some("json")
                && !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
            if is_document {
                paths.push(path);
            }
        }
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => match serde_json::from_str::<Value>(&content) {
                    Ok(document) => documents.push(document),
                    Err(e) => {
                        tracing::warn!(target: "aide.storage", "Failed to parse document {:?}: {}", path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!(target: "aide.storage", "Failed to read document {:?}: {}", path, e);
                }
            }
        }

        Ok(documents)
    }
}
