// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Arithmetic calculator tool

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;
use crate::tools::{SchemaBuilder, ToolDeclaration, ToolHandler};

pub(super) const FUNCTION_NAME: &str = "calculate";

/// Basic arithmetic on two operands
pub struct CalculateTool;

#[async_trait]
impl ToolHandler for CalculateTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration::function(
            "Calculator",
            FUNCTION_NAME,
            "Perform a basic arithmetic operation on two numbers",
            SchemaBuilder::new()
                .string_enum(
                    "operation",
                    &["add", "subtract", "multiply", "divide"],
                    true,
                )
                .number("operand1", "The first operand", true)
                .number("operand2", "The second operand", true)
                .build(),
        )
        .with_label_description("Adds, subtracts, multiplies or divides two numbers.")
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let operation = arguments["operation"].as_str().unwrap_or_default();
        let (a, b) = match (
            operand(&arguments["operand1"]),
            operand(&arguments["operand2"]),
        ) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(ToolError::InvalidArguments(
                    "Both operand1 and operand2 should be numbers.".to_string(),
                ))
            }
        };

        let result = match operation {
            "add" => a + b,
            "subtract" => a - b,
            "multiply" => a * b,
            "divide" if b == 0.0 => {
                return Err(ToolError::Execution("Cannot divide by zero.".to_string()))
            }
            "divide" => a / b,
            other => {
                return Err(ToolError::Execution(format!(
                    "Unsupported operation: {}",
                    other
                )))
            }
        };

        Ok(serde_json::json!({ "result": result }))
    }
}

/// Numbers, or strings that parse as numbers
fn operand(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
