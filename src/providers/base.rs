//! Base LLM provider interface.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A tool call request from the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: HashMap<String, serde_json::Value>,
}

impl ToolCallRequest {
    /// Convert to OpenAI function-call JSON format.
    pub fn to_openai_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "type": "function",
            "function": {
                "name": self.name,
                "arguments": serde_json::to_string(&self.arguments)
                    .unwrap_or_else(|_| "{}".to_string()),
            }
        })
    }
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub finish_reason: String,
    pub usage: HashMap<String, i64>,
}

impl LLMResponse {
    /// Check if the response contains tool calls.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Check if the provider failed and the failure was folded into content.
    pub fn is_error(&self) -> bool {
        self.finish_reason == "error"
    }
}

/// Abstract base trait for LLM providers.
///
/// Implementations handle the specifics of each provider's API while
/// maintaining a consistent interface. Transport and HTTP failures are
/// normalized into an `LLMResponse` with `finish_reason == "error"` so a
/// single call site decides the user-visible degradation.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send a chat completion request.
    ///
    /// # Arguments
    /// * `messages` - List of message objects with `role` and `content`.
    /// * `tools` - Optional list of tool definitions in OpenAI format.
    /// * `model` - Model identifier (provider-specific). None = default.
    /// * `max_tokens` - Maximum tokens in response.
    /// * `temperature` - Sampling temperature.
    async fn chat(
        &self,
        messages: &[serde_json::Value],
        tools: Option<&[serde_json::Value]>,
        model: Option<&str>,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<LLMResponse>;

    /// Get the default model for this provider.
    fn get_default_model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_call_request_to_openai_json() {
        let mut args = HashMap::new();
        args.insert("query".to_string(), serde_json::json!("rust async"));
        let req = ToolCallRequest {
            id: "call_1".to_string(),
            name: "search".to_string(),
            arguments: args,
        };

        let json = req.to_openai_json();
        assert_eq!(json["id"], "call_1");
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "search");
        // Arguments are double-encoded per the OpenAI wire format.
        let args_str = json["function"]["arguments"].as_str().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(args_str).unwrap();
        assert_eq!(parsed["query"], "rust async");
    }

    #[test]
    fn test_has_tool_calls() {
        let response = LLMResponse {
            content: Some("hello".to_string()),
            tool_calls: Vec::new(),
            finish_reason: "stop".to_string(),
            usage: HashMap::new(),
        };
        assert!(!response.has_tool_calls());
        assert!(!response.is_error());
    }

    #[test]
    fn test_is_error() {
        let response = LLMResponse {
            content: Some("Error calling LLM: connection refused".to_string()),
            tool_calls: Vec::new(),
            finish_reason: "error".to_string(),
            usage: HashMap::new(),
        };
        assert!(response.is_error());
    }
}
