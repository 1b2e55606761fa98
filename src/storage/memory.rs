// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! In-memory document store

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::{validate_id, DocumentStore};
use crate::error::Result;

type Collections = HashMap<String, BTreeMap<String, Value>>;

/// Process-local store, used by tests and `--ephemeral` runs
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collections(&self) -> MutexGuard<'_, Collections> {
        match self.collections.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!(target: "aide.storage", "Memory store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn save(&self, collection: &str, id: &str, document: &Value) -> Result<()> {
        validate_id(id)?;
        self.collections()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document.clone());
        Ok(())
    }

    async fn load(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        validate_id(id)?;
        Ok(self
            .collections()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        validate_id(id)?;
        Ok(self
            .collections()
            .get_mut(collection)
            .is_some_and(|docs| docs.remove(id).is_some()))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Value>> {
        Ok(self
            .collections()
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }
}
