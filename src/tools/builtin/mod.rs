// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Built-in tools
//!
//! These are also the default declaration set written to an empty store.

mod calculate;
mod weather;

pub use calculate::CalculateTool;
pub use weather::WeatherTool;

use std::sync::Arc;

use crate::config::ToolSettings;
use crate::tools::{ToolDeclaration, ToolHandler, ToolRegistry};

/// Register every built-in tool
pub fn register_builtins(registry: &mut ToolRegistry, settings: &ToolSettings) {
    registry.register(
        weather::FUNCTION_NAME,
        Arc::new(WeatherTool::from_settings(settings)),
    );
    registry.register(calculate::FUNCTION_NAME, Arc::new(CalculateTool));
}

/// Declaration of the `calculate` tool
pub fn calculate_declaration() -> ToolDeclaration {
    CalculateTool.declaration()
}

/// Declaration of the `get_current_weather` tool
pub fn weather_declaration() -> ToolDeclaration {
    weather::declaration()
}

/// The built-in declaration set, in registration order
pub fn default_declarations() -> Vec<ToolDeclaration> {
    vec![weather_declaration(), calculate_declaration()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::validate_declarations;

    #[test]
    fn test_default_declarations_are_valid() {
        let declarations = default_declarations();
        assert!(validate_declarations(&declarations).is_ok());
        assert_eq!(declarations[0].name, "Get Current Weather");
        assert_eq!(declarations[0].dispatch_key(), "get_current_weather");
        assert_eq!(declarations[1].dispatch_key(), "calculate");
    }

    #[test]
    fn test_register_builtins() {
        let registry = ToolRegistry::with_builtins(&ToolSettings::default());
        assert_eq!(
            registry.handler_names(),
            vec!["calculate", "get_current_weather"]
        );
        assert_eq!(*registry.declarations(), default_declarations());
    }
}
