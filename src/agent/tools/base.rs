//! Base trait and outcome type for agent tools.

use std::collections::HashMap;

use async_trait::async_trait;

/// Uniform outcome of a tool invocation.
///
/// Tools never return raw provider payloads or propagate errors: a failure
/// becomes a `Text` outcome carrying an `Error:`-prefixed explanation, and a
/// structured success carries both the machine shape and a formatted string
/// for the model context.
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    Text(String),
    Structured {
        value: serde_json::Value,
        formatted: String,
    },
}

impl ToolOutcome {
    /// Build a degraded error outcome.
    pub fn error(message: impl std::fmt::Display) -> Self {
        ToolOutcome::Text(format!("Error: {}", message))
    }

    /// The textual form fed back into the model context.
    pub fn as_text(&self) -> &str {
        match self {
            ToolOutcome::Text(s) => s,
            ToolOutcome::Structured { formatted, .. } => formatted,
        }
    }

    /// Whether this outcome is a degraded error.
    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Text(s) if s.starts_with("Error:"))
    }

    /// The structured value when present.
    pub fn structured_value(&self) -> Option<&serde_json::Value> {
        match self {
            ToolOutcome::Structured { value, .. } => Some(value),
            ToolOutcome::Text(_) => None,
        }
    }
}

/// Abstract base trait for agent tools.
///
/// Tools are capabilities the model can request mid-conversation: web
/// search, weather lookup, and so on. Execution must fail soft: adapter
/// errors come back as degraded [`ToolOutcome::Text`] values.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in function calls.
    fn name(&self) -> &str;

    /// Description of what the tool does (the model's menu entry).
    fn description(&self) -> &str;

    /// JSON Schema for tool parameters.
    fn parameters(&self) -> serde_json::Value;

    /// Execute the tool with given parameters.
    async fn execute(&self, params: HashMap<String, serde_json::Value>) -> ToolOutcome;

    /// Convert tool to OpenAI function schema format.
    fn to_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters(),
            }
        })
    }
}
