// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Generation configuration sent by the chat client
//!
//! Every optional field is skipped when unset. Providers treat an explicit
//! `null` differently from an absent key, so nothing here serializes as null.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::tools::ToolDeclaration;

/// Per-request model configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Upstream model identifier (required for a chat turn)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Sampling and decoding parameters
    #[serde(flatten)]
    pub sampling: SamplingParams,

    /// Tools the caller wants offered. Narrows the registry's enabled set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDeclaration>>,

    /// How the model should choose tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

/// Optional generation parameters, forwarded verbatim when set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopSequences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<HashMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_a: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_logprobs: Option<u32>,
    /// Structured output schema, passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
}

/// Stop sequence(s): a single string or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopSequences {
    One(String),
    Many(Vec<String>),
}

/// How the model should choose to use tools
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ToolChoice {
    /// Let the model decide
    #[default]
    Auto,
    /// Don't use any tools
    None,
    /// Must use a tool
    Required,
    /// Use a specific function
    Function(String),
}

impl Serialize for ToolChoice {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ToolChoice::Auto => serializer.serialize_str("auto"),
            ToolChoice::None => serializer.serialize_str("none"),
            ToolChoice::Required => serializer.serialize_str("required"),
            ToolChoice::Function(name) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "function")?;
                map.serialize_entry("function", &serde_json::json!({ "name": name }))?;
                map.end()
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawToolChoice {
    Mode(String),
    Function { function: RawFunctionName },
}

#[derive(Deserialize)]
struct RawFunctionName {
    name: String,
}

impl<'de> Deserialize<'de> for ToolChoice {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawToolChoice::deserialize(deserializer)? {
            RawToolChoice::Mode(mode) => match mode.as_str() {
                "auto" => Ok(ToolChoice::Auto),
                "none" => Ok(ToolChoice::None),
                "required" => Ok(ToolChoice::Required),
                other => Err(serde::de::Error::custom(format!(
                    "unknown tool_choice '{}'",
                    other
                ))),
            },
            RawToolChoice::Function { function } => Ok(ToolChoice::Function(function.name)),
        }
    }
}

impl Configuration {
    /// Create a configuration with only the model set
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Default::default()
        }
    }

    /// The model id, if present and non-blank
    pub fn model_id(&self) -> Option<&str> {
        self.model.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_only_serializes_model() {
        let json = serde_json::to_value(Configuration::for_model("m1")).unwrap();
        assert_eq!(json, serde_json::json!({"model": "m1"}));
    }

    #[test]
    fn test_deserialize_flat_configuration() {
        let raw = r#"{
            "model": "openai/gpt-4o",
            "temperature": 0.2,
            "max_tokens": 256,
            "stop": ["\n\n", "END"],
            "logit_bias": {"50256": -100},
            "tool_choice": "none",
            "stream": true
        }"#;
        let config: Configuration = serde_json::from_str(raw).unwrap();

        assert_eq!(config.model_id(), Some("openai/gpt-4o"));
        assert_eq!(config.sampling.temperature, Some(0.2));
        assert_eq!(config.sampling.max_tokens, Some(256));
        assert_eq!(
            config.sampling.stop,
            Some(StopSequences::Many(vec!["\n\n".into(), "END".into()]))
        );
        assert_eq!(config.sampling.logit_bias.unwrap()["50256"], -100.0);
        assert_eq!(config.tool_choice, Some(ToolChoice::None));
    }

    #[test]
    fn test_single_stop_string() {
        let config: Configuration =
            serde_json::from_str("{\"model\": \"m\", \"stop\": \"###\"}").unwrap();
        assert_eq!(
            config.sampling.stop,
            Some(StopSequences::One("###".to_string()))
        );
    }

    #[test]
    fn test_blank_model_is_missing() {
        let config = Configuration::for_model("  ");
        assert!(config.model_id().is_none());
        assert!(Configuration::default().model_id().is_none());
    }

    #[test]
    fn test_tool_choice_serialization() {
        assert_eq!(serde_json::to_string(&ToolChoice::Auto).unwrap(), "\"auto\"");
        assert_eq!(serde_json::to_string(&ToolChoice::None).unwrap(), "\"none\"");
        assert_eq!(
            serde_json::to_string(&ToolChoice::Required).unwrap(),
            "\"required\""
        );
        assert_eq!(
            serde_json::to_value(ToolChoice::Function("calculate".into())).unwrap(),
            serde_json::json!({"type": "function", "function": {"name": "calculate"}})
        );
    }

    #[test]
    fn test_tool_choice_deserialization() {
        let explicit: ToolChoice = serde_json::from_str(
            r#"{"type": "function", "function": {"name": "get_current_weather"}}"#,
        )
        .unwrap();
        assert_eq!(
            explicit,
            ToolChoice::Function("get_current_weather".to_string())
        );

        let auto: ToolChoice = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(auto, ToolChoice::Auto);

        assert!(serde_json::from_str::<ToolChoice>("\"sometimes\"").is_err());
    }
}
