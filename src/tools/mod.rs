// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool system for the gateway
//!
//! Handlers are registered once at startup and never change. The declaration
//! list offered to the model is read-mostly and replaced wholesale when tools
//! are saved, so an in-flight turn always sees one consistent snapshot.

pub mod builtin;
pub mod definition;
pub mod invoker;

pub use definition::*;
pub use invoker::*;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::ToolSettings;
use crate::error::{GatewayError, Result, ToolError};
use crate::storage::{self, DocumentStore};

/// Document id of the declaration set inside the tools collection
const DECLARATIONS_ID: &str = "declarations";

/// Trait for implementing tools
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// The declaration offered to the model by default
    fn declaration(&self) -> ToolDeclaration;

    /// Run the tool. `arguments` is always a JSON object.
    async fn call(&self, arguments: Value) -> std::result::Result<Value, ToolError>;
}

/// Registry of available tools
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    declarations: RwLock<Arc<Vec<ToolDeclaration>>>,
    /// Serializes store write + swap so the store and the live list agree
    save_lock: tokio::sync::Mutex<()>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            declarations: RwLock::new(Arc::new(Vec::new())),
            save_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Create a registry with the built-in tools
    pub fn with_builtins(settings: &ToolSettings) -> Self {
        let mut registry = Self::new();
        builtin::register_builtins(&mut registry, settings);
        registry
    }

    /// Register a handler under a dispatch name.
    ///
    /// Its default declaration joins the list unless one with the same
    /// function name is already there.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn ToolHandler>) {
        let name = name.into();
        let mut declaration = handler.declaration();
        declaration.function.name = name.clone();

        {
            let mut current = self.write_declarations();
            if !current.iter().any(|d| d.dispatch_key() == name) {
                let mut next = current.as_ref().clone();
                next.push(declaration);
                *current = Arc::new(next);
            }
        }

        self.handlers.insert(name, handler);
    }

    /// Look up the handler for a function name.
    ///
    /// The name must also have a declaration in the current list, and that
    /// declaration must be enabled.
    pub fn lookup(&self, name: &str) -> std::result::Result<Arc<dyn ToolHandler>, ToolError> {
        let handler = self
            .handlers
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        match self
            .read_declarations()
            .iter()
            .find(|d| d.dispatch_key() == name)
        {
            Some(declaration) if declaration.enabled => Ok(handler),
            Some(_) => Err(ToolError::Disabled(name.to_string())),
            None => Err(ToolError::NotFound(name.to_string())),
        }
    }

    /// Function names in `declarations` that no registered handler serves
    pub fn unhandled<'a>(&self, declarations: &'a [ToolDeclaration]) -> Vec<&'a str> {
        declarations
            .iter()
            .map(ToolDeclaration::dispatch_key)
            .filter(|name| !self.handlers.contains_key(*name))
            .collect()
    }

    /// Names with a registered handler, sorted
    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Snapshot of every declaration, enabled or not
    pub fn declarations(&self) -> Arc<Vec<ToolDeclaration>> {
        Arc::clone(&self.read_declarations())
    }

    /// Enabled declarations in stored order
    pub fn list_enabled(&self) -> Vec<ToolDeclaration> {
        self.declarations()
            .iter()
            .filter(|d| d.enabled)
            .cloned()
            .collect()
    }

    /// Validate and atomically swap in a new declaration list
    pub fn replace_declarations(&self, declarations: Vec<ToolDeclaration>) -> Result<()> {
        validate_declarations(&declarations)?;
        let count = declarations.len();
        *self.write_declarations() = Arc::new(declarations);
        tracing::info!(target: "aide.tools.registry", count, "tool declarations replaced");
        Ok(())
    }

    /// Validate, persist, then swap in a new declaration list
    pub async fn save_declarations(
        &self,
        store: &dyn DocumentStore,
        declarations: Vec<ToolDeclaration>,
    ) -> Result<()> {
        validate_declarations(&declarations)?;
        for name in self.unhandled(&declarations) {
            tracing::warn!(
                target: "aide.tools.registry",
                tool = name,
                "declared tool has no handler, calls to it will fail"
            );
        }

        let _guard = self.save_lock.lock().await;
        let document = serde_json::to_value(&declarations)?;
        store
            .save(storage::TOOLS, DECLARATIONS_ID, &document)
            .await?;
        self.replace_declarations(declarations)
    }

    /// Load the stored declaration set.
    ///
    /// When the store holds none, the registry's current declarations (the
    /// built-in defaults) are kept and written back.
    pub async fn load_from_store(&self, store: &dyn DocumentStore) -> Result<()> {
        let stored = store.load(storage::TOOLS, DECLARATIONS_ID).await?;

        let declarations: Vec<ToolDeclaration> = match stored {
            Some(document) => serde_json::from_value(document).map_err(|e| {
                GatewayError::Storage(format!("Failed to parse stored tools: {}", e))
            })?,
            None => Vec::new(),
        };

        if declarations.is_empty() {
            tracing::warn!(
                target: "aide.tools.registry",
                "no stored tools, seeding with built-in defaults"
            );
            let defaults = self.declarations().as_ref().clone();
            return self.save_declarations(store, defaults).await;
        }

        tracing::info!(
            target: "aide.tools.registry",
            count = declarations.len(),
            "loaded tools from store"
        );
        self.replace_declarations(declarations)
    }

    fn read_declarations(&self) -> RwLockReadGuard<'_, Arc<Vec<ToolDeclaration>>> {
        match self.declarations.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!(target: "aide.tools.registry", "declaration lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_declarations(&self) -> RwLockWriteGuard<'_, Arc<Vec<ToolDeclaration>>> {
        match self.declarations.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!(target: "aide.tools.registry", "declaration lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
