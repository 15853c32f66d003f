//! Tool registry: the fixed, process-wide menu of callable tools.

use std::collections::HashMap;

use super::base::{Tool, ToolOutcome};

/// Registry for agent tools.
///
/// Populated once at startup and read-only afterwards. Execution fails
/// soft: unknown names and adapter failures come back as degraded text
/// outcomes, and panics inside a tool are caught so a single tool failure
/// can never crash the orchestrator.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a reference to a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Check if a tool is registered.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get all tool definitions in OpenAI format.
    pub fn definitions(&self) -> Vec<serde_json::Value> {
        self.tools.values().map(|tool| tool.to_schema()).collect()
    }

    /// Execute a tool by name with given parameters.
    ///
    /// Catches panics so a single tool failure doesn't crash the agent loop.
    pub async fn execute(
        &self,
        name: &str,
        params: HashMap<String, serde_json::Value>,
    ) -> ToolOutcome {
        let tool = match self.tools.get(name) {
            Some(t) => t,
            None => return ToolOutcome::error(format!("Tool '{}' not found", name)),
        };

        let fut = std::panic::AssertUnwindSafe(tool.execute(params));
        match futures_util::FutureExt::catch_unwind(fut).await {
            Ok(outcome) => outcome,
            Err(_) => ToolOutcome::error(format!("Tool '{}' panicked during execution", name)),
        }
    }

    /// Get list of registered tool names.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
