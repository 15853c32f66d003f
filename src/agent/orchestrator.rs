//! Conversation orchestrator: the multi-step tool-calling protocol.
//!
//! One run per chat request: send the running message list plus tool menu
//! to the model, execute any requested tools (sibling calls concurrently),
//! append the results, and repeat up to a step budget. Budget exhaustion
//! forces a final answer from whatever was accumulated; a run never hangs
//! and never surfaces a raw provider error.

use std::sync::Arc;

use futures_util::future::join_all;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::agent::tools::registry::ToolRegistry;
use crate::providers::base::{LLMProvider, LLMResponse, ToolCallRequest};

/// Built-in assistant persona. Overridable via `agent.systemPrompt`.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are VOX, an advanced AI assistant. Respond as a highly capable, \
resourceful, and loyal digital butler. Be concise, intelligent, and display \
a subtle, dry wit. Address the user with respectful confidence, occasionally \
using phrases like 'sir' or 'ma'am' when appropriate. Prioritize clarity, \
efficiency, and a touch of charm. Keep responses under 150 words unless more \
detail is specifically requested. You have access to tools for web search, \
weather, academic papers, and information about your creator; use them when \
they help. Never include markdown, code formatting, or source links in your \
replies. Remain professional and never break character.";

/// Canned responses when the completion provider is unreachable.
const FALLBACK_RESPONSES: [&str; 3] = [
    "Systems temporarily offline. Please try again in a moment, sir.",
    "Experiencing minor technical difficulties. Attempting to restore full functionality.",
    "Neural networks are recalibrating. Please stand by for full system restoration.",
];

/// One chat message as received from (and echoed to) the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// One recorded tool call in the usage trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool: String,
    pub args: serde_json::Value,
}

/// Side-channel trace of a run, consumed by the UI status indicator.
///
/// Informational only: its completeness never affects the final answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUsage {
    pub total_steps: u32,
    pub tool_calls: Vec<ToolCallRecord>,
}

/// Final result of one orchestration run.
#[derive(Debug, Clone)]
pub struct OrchestratorReply {
    pub response: String,
    pub tool_usage: ToolUsage,
}

/// The conversation orchestrator.
///
/// Holds the injected completion provider and tool registry; stateless
/// between runs (the caller resends full history each turn).
pub struct Orchestrator {
    llm: Arc<dyn LLMProvider>,
    tools: Arc<ToolRegistry>,
    model: Option<String>,
    max_tokens: u32,
    temperature: f64,
    step_budget: u32,
    system_prompt: String,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LLMProvider>,
        tools: Arc<ToolRegistry>,
        model: Option<String>,
        max_tokens: u32,
        temperature: f64,
        step_budget: u32,
        system_prompt: Option<String>,
    ) -> Self {
        Self {
            llm,
            tools,
            model,
            max_tokens,
            temperature,
            step_budget: step_budget.max(1),
            system_prompt: system_prompt.unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }

    /// Run the tool-calling loop over the caller's message history.
    ///
    /// Always returns a non-empty response; model calls are bounded by
    /// `step_budget + 1` (the +1 is the forced no-tools finalization).
    pub async fn run(&self, history: &[ChatMessage]) -> OrchestratorReply {
        let mut messages: Vec<serde_json::Value> = Vec::with_capacity(history.len() + 1);
        messages.push(serde_json::json!({
            "role": "system",
            "content": self.system_prompt,
        }));
        for msg in history {
            messages.push(serde_json::json!({
                "role": msg.role,
                "content": msg.content,
            }));
        }

        let definitions = self.tools.definitions();
        let mut usage = ToolUsage::default();
        let mut last_content: Option<String> = None;

        for step in 0..self.step_budget {
            let response = match self
                .llm
                .chat(
                    &messages,
                    Some(&definitions),
                    self.model.as_deref(),
                    self.max_tokens,
                    self.temperature,
                )
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    warn!("Completion provider failed at step {}: {}", step, e);
                    return self.apology(usage);
                }
            };

            if response.is_error() {
                warn!(
                    "Completion provider degraded at step {}: {}",
                    step,
                    response.content.as_deref().unwrap_or("")
                );
                return self.apology(usage);
            }

            usage.total_steps += 1;

            if !response.has_tool_calls() {
                // Terminal state: plain content is the final answer.
                let answer = response
                    .content
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| self.pick_apology());
                return OrchestratorReply {
                    response: answer,
                    tool_usage: usage,
                };
            }

            last_content = response.content.clone().filter(|c| !c.trim().is_empty());
            self.execute_step(&response, &mut messages, &mut usage).await;
        }

        // Budget exhausted: force a final answer without the tool menu.
        debug!(
            "Step budget of {} exhausted; forcing final answer",
            self.step_budget
        );
        match self
            .llm
            .chat(
                &messages,
                None,
                self.model.as_deref(),
                self.max_tokens,
                self.temperature,
            )
            .await
        {
            Ok(response) if !response.is_error() => {
                usage.total_steps += 1;
                let answer = response
                    .content
                    .filter(|c| !c.trim().is_empty())
                    .or(last_content)
                    .unwrap_or_else(|| self.pick_apology());
                OrchestratorReply {
                    response: answer,
                    tool_usage: usage,
                }
            }
            _ => OrchestratorReply {
                response: last_content.unwrap_or_else(|| self.pick_apology()),
                tool_usage: usage,
            },
        }
    }

    /// Execute all tool calls from one model response and append the
    /// assistant turn plus each tool result to the conversation.
    ///
    /// Sibling calls have no ordering dependency, so they run concurrently;
    /// all must complete before the next model call (per-step barrier).
    async fn execute_step(
        &self,
        response: &LLMResponse,
        messages: &mut Vec<serde_json::Value>,
        usage: &mut ToolUsage,
    ) {
        let tool_call_json: Vec<serde_json::Value> = response
            .tool_calls
            .iter()
            .map(ToolCallRequest::to_openai_json)
            .collect();
        messages.push(serde_json::json!({
            "role": "assistant",
            "content": response.content.clone().unwrap_or_default(),
            "tool_calls": tool_call_json,
        }));

        let executions = response.tool_calls.iter().map(|call| {
            let registry = Arc::clone(&self.tools);
            async move {
                debug!("Executing tool {} ({})", call.name, call.id);
                registry.execute(&call.name, call.arguments.clone()).await
            }
        });
        let outcomes = join_all(executions).await;

        for (call, outcome) in response.tool_calls.iter().zip(outcomes) {
            if outcome.is_error() {
                match crate::errors::classify_tool_error(outcome.as_text()) {
                    Some(kind) => warn!("Tool {} degraded: {}", call.name, kind),
                    None => warn!("Tool {} degraded: {}", call.name, outcome.as_text()),
                }
            }
            usage.tool_calls.push(ToolCallRecord {
                tool: call.name.clone(),
                args: serde_json::to_value(&call.arguments).unwrap_or_default(),
            });
            messages.push(serde_json::json!({
                "role": "tool",
                "tool_call_id": call.id,
                "content": outcome.as_text(),
            }));
        }
    }

    fn pick_apology(&self) -> String {
        FALLBACK_RESPONSES
            .choose(&mut rand::thread_rng())
            .unwrap_or(&FALLBACK_RESPONSES[0])
            .to_string()
    }

    fn apology(&self, usage: ToolUsage) -> OrchestratorReply {
        OrchestratorReply {
            response: self.pick_apology(),
            tool_usage: usage,
        }
    }
}
