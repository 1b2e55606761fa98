// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool declaration types
//!
//! A declaration is what the model sees. It is dispatched by
//! `function.name`; the outer `name` is only a display label.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::{GatewayError, Result};

const MAX_FUNCTION_NAME_LEN: usize = 64;

/// A stored tool declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Display label
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(rename = "type", default = "default_tool_type")]
    pub tool_type: String,

    pub function: FunctionSpec,
}

/// The callable function exposed to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub parameters: FunctionParameters,
}

/// JSON-Schema-like argument description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionParameters {
    #[serde(rename = "type", default = "default_schema_type")]
    pub schema_type: String,

    #[serde(default)]
    pub properties: Map<String, Value>,

    #[serde(default)]
    pub required: Vec<String>,

    /// Any other schema keywords, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

fn default_tool_type() -> String {
    "function".to_string()
}

fn default_schema_type() -> String {
    "object".to_string()
}

impl Default for FunctionParameters {
    fn default() -> Self {
        Self {
            schema_type: default_schema_type(),
            properties: Map::new(),
            required: vec![],
            extra: Map::new(),
        }
    }
}

impl ToolDeclaration {
    /// Create an enabled function declaration
    pub fn function(
        label: impl Into<String>,
        function_name: impl Into<String>,
        description: impl Into<String>,
        parameters: FunctionParameters,
    ) -> Self {
        let description = description.into();
        Self {
            name: label.into(),
            description: description.clone(),
            enabled: true,
            tool_type: default_tool_type(),
            function: FunctionSpec {
                name: function_name.into(),
                description,
                parameters,
            },
        }
    }

    /// Set the description shown to users, separate from the model-facing one
    pub fn with_label_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The key used to dispatch calls to this tool
    pub fn dispatch_key(&self) -> &str {
        &self.function.name
    }
}

/// Helper to create a function parameter schema
pub struct SchemaBuilder {
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            properties: Map::new(),
            required: vec![],
        }
    }

    fn property(mut self, name: &str, schema: Value, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    /// Add a string property
    pub fn string(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            serde_json::json!({
                "type": "string",
                "description": description
            }),
            required,
        )
    }

    /// Add a number property
    pub fn number(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            serde_json::json!({
                "type": "number",
                "description": description
            }),
            required,
        )
    }

    /// Add a string property restricted to a fixed set of values
    pub fn string_enum(self, name: &str, values: &[&str], required: bool) -> Self {
        self.property(
            name,
            serde_json::json!({
                "type": "string",
                "enum": values
            }),
            required,
        )
    }

    /// Build the schema
    pub fn build(self) -> FunctionParameters {
        FunctionParameters {
            schema_type: default_schema_type(),
            properties: self.properties,
            required: self.required,
            extra: Map::new(),
        }
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn is_function_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_FUNCTION_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Check a single declaration in isolation
pub fn validate_declaration(declaration: &ToolDeclaration) -> Result<()> {
    let key = declaration.dispatch_key();

    if declaration.tool_type != "function" {
        return Err(GatewayError::InvalidRequest(format!(
            "tool '{}': unsupported type '{}'",
            key, declaration.tool_type
        )));
    }

    if !is_function_name(key) {
        return Err(GatewayError::InvalidRequest(format!(
            "invalid function name '{}': expected 1-64 of [A-Za-z0-9_-]",
            key
        )));
    }

    // A label that looks like a function name must be that function name.
    if is_function_name(&declaration.name) && declaration.name != key {
        return Err(GatewayError::InvalidRequest(format!(
            "tool name '{}' does not match function name '{}'",
            declaration.name, key
        )));
    }

    let parameters = &declaration.function.parameters;
    if parameters.schema_type != "object" {
        return Err(GatewayError::InvalidRequest(format!(
            "tool '{}': parameters type must be 'object'",
            key
        )));
    }

    if let Some(missing) = parameters
        .required
        .iter()
        .find(|r| !parameters.properties.contains_key(r.as_str()))
    {
        return Err(GatewayError::InvalidRequest(format!(
            "tool '{}': required parameter '{}' is not declared",
            key, missing
        )));
    }

    Ok(())
}

/// Check a declaration set: every entry valid, dispatch keys unique
pub fn validate_declarations(declarations: &[ToolDeclaration]) -> Result<()> {
    let mut seen = HashSet::new();
    for declaration in declarations {
        validate_declaration(declaration)?;
        if !seen.insert(declaration.dispatch_key()) {
            return Err(GatewayError::InvalidRequest(format!(
                "duplicate function name '{}'",
                declaration.dispatch_key()
            )));
        }
    }
    Ok(())
}
