//! Static creator-profile tool.

use std::collections::HashMap;

use async_trait::async_trait;

use super::base::{Tool, ToolOutcome};

/// Profile text returned to the model. No network call, always succeeds.
const CREATOR_PROFILE: &str = "\
The creator of the Voxbot assistant is the Voxbot project team, led by a \
systems engineer focused on practical, clean technology.

Key background:
- Role: backend and infrastructure engineering
- Focus: voice interfaces, conversational tooling, and developer productivity
- Personality: practical, avoids buzzwords, direct and thoughtful

Notable projects:
1. Voxbot - this voice-enabled assistant gateway
2. A document generation and writing assistant for academic papers
3. A smart job-matching mobile application
4. An AI misinformation detection platform

Technical stack:
- Languages: Rust, Python, TypeScript, Kotlin, SQL
- Backend: async services, REST gateways, hosted model APIs
- ML/AI: retrieval pipelines, speech interfaces, fine-tuned classifiers

The creator values smart, clean technology and prefers practical solutions \
over buzzwords.";

/// Return information about who built the assistant.
pub struct CreatorInfoTool;

#[async_trait]
impl Tool for CreatorInfoTool {
    fn name(&self) -> &str {
        "creator_info"
    }

    fn description(&self) -> &str {
        "Get information about the creator of the assistant."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: HashMap<String, serde_json::Value>) -> ToolOutcome {
        ToolOutcome::Text(CREATOR_PROFILE.to_string())
    }
}
