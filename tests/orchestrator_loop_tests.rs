//! Orchestration loop properties: bounded termination, per-step tool
//! barriers, and degraded-tool completion, driven by a scripted model stub.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use voxbot::agent::orchestrator::{ChatMessage, Orchestrator};
use voxbot::agent::tools::base::{Tool, ToolOutcome};
use voxbot::agent::tools::registry::ToolRegistry;
use voxbot::providers::base::{LLMProvider, LLMResponse, ToolCallRequest};

// ---------------------------------------------------------------------------
// Stubs
// ---------------------------------------------------------------------------

/// Scripted provider: pops responses in order, repeating the final entry,
/// and records whether the tool menu was attached to each call.
struct ScriptedLLM {
    script: Mutex<Vec<LLMResponse>>,
    calls: AtomicU32,
    tool_menu_sizes: Mutex<Vec<usize>>,
}

impl ScriptedLLM {
    fn new(script: Vec<LLMResponse>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            calls: AtomicU32::new(0),
            tool_menu_sizes: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMProvider for ScriptedLLM {
    async fn chat(
        &self,
        _messages: &[serde_json::Value],
        tools: Option<&[serde_json::Value]>,
        _model: Option<&str>,
        _max_tokens: u32,
        _temperature: f64,
    ) -> Result<LLMResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tool_menu_sizes
            .lock()
            .unwrap()
            .push(tools.map(|t| t.len()).unwrap_or(0));
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            Ok(script.remove(0))
        } else {
            Ok(script[0].clone())
        }
    }

    fn get_default_model(&self) -> &str {
        "scripted"
    }
}

/// Tool that counts invocations and returns a fixed payload.
struct CountingTool {
    name: &'static str,
    calls: Arc<AtomicU32>,
    fail: bool,
}

#[async_trait]
impl Tool for CountingTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Counting stub"
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _params: HashMap<String, serde_json::Value>) -> ToolOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            ToolOutcome::error("stub adapter failure")
        } else {
            ToolOutcome::Text(format!("{} ran", self.name))
        }
    }
}

fn text_response(content: &str) -> LLMResponse {
    LLMResponse {
        content: Some(content.to_string()),
        tool_calls: Vec::new(),
        finish_reason: "stop".to_string(),
        usage: HashMap::new(),
    }
}

fn tool_calls_response(names: &[&str]) -> LLMResponse {
    LLMResponse {
        content: None,
        tool_calls: names
            .iter()
            .enumerate()
            .map(|(i, name)| ToolCallRequest {
                id: format!("call_{}", i),
                name: name.to_string(),
                arguments: HashMap::new(),
            })
            .collect(),
        finish_reason: "tool_calls".to_string(),
        usage: HashMap::new(),
    }
}

fn orchestrator(
    llm: Arc<ScriptedLLM>,
    budget: u32,
    tool_counters: &[(&'static str, Arc<AtomicU32>, bool)],
) -> Orchestrator {
    let mut registry = ToolRegistry::new();
    for (name, calls, fail) in tool_counters {
        registry.register(Box::new(CountingTool {
            name: *name,
            calls: Arc::clone(calls),
            fail: *fail,
        }));
    }
    Orchestrator::new(llm, Arc::new(registry), None, 256, 0.7, budget, None)
}

fn user_turn(content: &str) -> Vec<ChatMessage> {
    vec![ChatMessage {
        role: "user".to_string(),
        content: content.to_string(),
    }]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_terminates_within_budget_plus_one_model_calls() {
    let counter = Arc::new(AtomicU32::new(0));
    for budget in [1u32, 3, 5] {
        let llm = ScriptedLLM::new(vec![tool_calls_response(&["alpha"])]);
        let orch = orchestrator(
            Arc::clone(&llm),
            budget,
            &[("alpha", Arc::clone(&counter), false)],
        );

        let reply = orch.run(&user_turn("loop forever")).await;
        assert!(
            llm.call_count() <= budget + 1,
            "budget {} produced {} model calls",
            budget,
            llm.call_count()
        );
        assert!(!reply.response.is_empty());
    }
}

#[tokio::test]
async fn sibling_tool_calls_all_execute_before_next_step() {
    let alpha = Arc::new(AtomicU32::new(0));
    let beta = Arc::new(AtomicU32::new(0));
    let llm = ScriptedLLM::new(vec![
        tool_calls_response(&["alpha", "beta"]),
        text_response("Both done."),
    ]);
    let orch = orchestrator(
        Arc::clone(&llm),
        4,
        &[
            ("alpha", Arc::clone(&alpha), false),
            ("beta", Arc::clone(&beta), false),
        ],
    );

    let reply = orch.run(&user_turn("do both")).await;
    assert_eq!(reply.response, "Both done.");
    assert_eq!(alpha.load(Ordering::SeqCst), 1);
    assert_eq!(beta.load(Ordering::SeqCst), 1);
    assert_eq!(reply.tool_usage.tool_calls.len(), 2);
    // Two model calls total: the tool step, then the answer.
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn failing_tool_never_aborts_the_run() {
    let counter = Arc::new(AtomicU32::new(0));
    let llm = ScriptedLLM::new(vec![
        tool_calls_response(&["broken"]),
        text_response("Recovered."),
    ]);
    let orch = orchestrator(
        Arc::clone(&llm),
        4,
        &[("broken", Arc::clone(&counter), true)],
    );

    let reply = orch.run(&user_turn("try the broken tool")).await;
    assert_eq!(reply.response, "Recovered.");
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(!reply.response.is_empty());
}

#[tokio::test]
async fn forced_finalization_goes_out_without_tool_menu() {
    let counter = Arc::new(AtomicU32::new(0));
    let llm = ScriptedLLM::new(vec![tool_calls_response(&["alpha"])]);
    let orch = orchestrator(
        Arc::clone(&llm),
        2,
        &[("alpha", Arc::clone(&counter), false)],
    );

    orch.run(&user_turn("loop")).await;

    let menu_sizes = llm.tool_menu_sizes.lock().unwrap().clone();
    assert_eq!(menu_sizes.len(), 3);
    // Budgeted steps carry the tool menu; the forced finalization does not.
    assert!(menu_sizes[0] > 0);
    assert!(menu_sizes[1] > 0);
    assert_eq!(menu_sizes[2], 0);
}

#[tokio::test]
async fn trace_reflects_every_tool_call() {
    let counter = Arc::new(AtomicU32::new(0));
    let llm = ScriptedLLM::new(vec![
        tool_calls_response(&["alpha"]),
        tool_calls_response(&["alpha", "alpha"]),
        text_response("Done."),
    ]);
    let orch = orchestrator(
        Arc::clone(&llm),
        5,
        &[("alpha", Arc::clone(&counter), false)],
    );

    let reply = orch.run(&user_turn("count these")).await;
    assert_eq!(reply.tool_usage.tool_calls.len(), 3);
    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert_eq!(reply.tool_usage.total_steps, 3);
    assert!(reply
        .tool_usage
        .tool_calls
        .iter()
        .all(|c| c.tool == "alpha"));
}

#[tokio::test]
async fn unknown_tool_request_degrades_and_continues() {
    let llm = ScriptedLLM::new(vec![
        tool_calls_response(&["no_such_tool"]),
        text_response("Still here."),
    ]);
    let orch = orchestrator(Arc::clone(&llm), 4, &[]);

    let reply = orch.run(&user_turn("call something odd")).await;
    assert_eq!(reply.response, "Still here.");
    assert_eq!(llm.call_count(), 2);
}
