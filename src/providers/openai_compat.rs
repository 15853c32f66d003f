//! OpenAI-compatible chat completions provider.
//!
//! Talks to any endpoint that implements the OpenAI chat completions API
//! format: OpenAI, OpenRouter, Groq, DeepSeek, and compatible gateways.
//! HTTP and transport failures are folded into an `LLMResponse` with
//! `finish_reason == "error"` instead of propagating, so the orchestrator
//! owns the user-visible degradation.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use backon::Retryable;
use reqwest::Client;
use tracing::{debug, warn};

use super::base::{LLMProvider, LLMResponse, ToolCallRequest};
use super::retry::{adjust_for_rate_limit, provider_backoff};
use crate::errors::ProviderError;

/// Per-request timeout for completion calls.
const CHAT_TIMEOUT: Duration = Duration::from_secs(60);

/// An LLM provider that talks to any OpenAI-compatible chat completions endpoint.
pub struct OpenAICompatProvider {
    api_key: String,
    api_base: String,
    default_model: String,
    client: Client,
}

impl OpenAICompatProvider {
    /// Create a new provider.
    ///
    /// Base URL resolution when `api_base` is not given:
    /// - `sk-or-` key prefix → OpenRouter
    /// - `gsk_` key prefix → Groq
    /// - routed model names (`org/model`) → OpenRouter
    /// - everything else → OpenAI direct
    pub fn new(api_key: &str, api_base: Option<&str>, default_model: Option<&str>) -> Self {
        let default_model = default_model.unwrap_or("gpt-4o-mini").to_string();

        let resolved_base = if let Some(base) = api_base {
            base.trim_end_matches('/').to_string()
        } else if api_key.starts_with("sk-or-") {
            "https://openrouter.ai/api/v1".to_string()
        } else if api_key.starts_with("gsk_") {
            "https://api.groq.com/openai/v1".to_string()
        } else if default_model.contains('/') {
            "https://openrouter.ai/api/v1".to_string()
        } else {
            "https://api.openai.com/v1".to_string()
        };

        Self {
            api_key: api_key.to_string(),
            api_base: resolved_base,
            default_model,
            client: Client::new(),
        }
    }

    /// Whether a credential is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Send the request once, classifying failures into [`ProviderError`].
    async fn send_once(&self, url: &str, body: &serde_json::Value) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .timeout(CHAT_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        let status = response.status();
        let retry_after_ms = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(|secs| secs * 1000);

        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::ResponseReadError(e.to_string()))?;

        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited {
                    status: 429,
                    retry_after_ms: retry_after_ms.unwrap_or(1000),
                });
            }
            return Err(ProviderError::from_status(status.as_u16(), text));
        }

        Ok(text)
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatProvider {
    async fn chat(
        &self,
        messages: &[serde_json::Value],
        tools: Option<&[serde_json::Value]>,
        model: Option<&str>,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<LLMResponse> {
        let raw_model = model.unwrap_or(&self.default_model);
        // OpenRouter keeps org/model for routing; direct cloud APIs get the
        // bare model name (e.g. "openai/gpt-4o-mini" → "gpt-4o-mini").
        let model = if self.api_base.contains("openrouter") {
            raw_model
        } else {
            raw_model.split('/').next_back().unwrap_or(raw_model)
        };

        debug!(
            "chat: api_base={} model={} messages={}",
            self.api_base,
            model,
            messages.len()
        );

        let url = format!("{}/chat/completions", self.api_base);

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        if let Some(tool_defs) = tools {
            if !tool_defs.is_empty() {
                body["tools"] = serde_json::Value::Array(tool_defs.to_vec());
                body["tool_choice"] = serde_json::json!("auto");
            }
        }

        let send = || async { self.send_once(&url, &body).await };
        let result = send
            .retry(provider_backoff())
            .when(|e: &ProviderError| e.is_retryable())
            .adjust(adjust_for_rate_limit)
            .await;

        let response_text = match result {
            Ok(text) => text,
            Err(e) => {
                warn!("LLM request failed (base={}): {}", self.api_base, e);
                return Ok(LLMResponse {
                    content: Some(format!("Error calling LLM: {}", e)),
                    tool_calls: Vec::new(),
                    finish_reason: "error".to_string(),
                    usage: HashMap::new(),
                });
            }
        };

        let data: serde_json::Value = match serde_json::from_str(&response_text) {
            Ok(v) => v,
            Err(e) => {
                return Ok(LLMResponse {
                    content: Some(format!("Error parsing LLM response JSON: {}", e)),
                    tool_calls: Vec::new(),
                    finish_reason: "error".to_string(),
                    usage: HashMap::new(),
                });
            }
        };

        Ok(parse_response(&data))
    }

    fn get_default_model(&self) -> &str {
        &self.default_model
    }
}

/// Parse an OpenAI-format chat completion into an [`LLMResponse`].
fn parse_response(data: &serde_json::Value) -> LLMResponse {
    let choices = data
        .get("choices")
        .and_then(|c| c.as_array())
        .cloned()
        .unwrap_or_default();

    if choices.is_empty() {
        return LLMResponse {
            content: Some("Error: No choices in LLM response".to_string()),
            tool_calls: Vec::new(),
            finish_reason: "error".to_string(),
            usage: HashMap::new(),
        };
    }

    let choice = &choices[0];
    let message = choice.get("message").cloned().unwrap_or_default();
    let finish_reason = choice
        .get("finish_reason")
        .and_then(|v| v.as_str())
        .unwrap_or("stop")
        .to_string();

    let content = message
        .get("content")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let tool_calls = message
        .get("tool_calls")
        .and_then(|v| v.as_array())
        .map(|calls| {
            calls
                .iter()
                .filter_map(|call| {
                    let id = call.get("id").and_then(|v| v.as_str())?.to_string();
                    let function = call.get("function")?;
                    let name = function.get("name").and_then(|v| v.as_str())?.to_string();
                    // Arguments arrive double-encoded; tolerate malformed JSON
                    // by passing an empty argument map.
                    let arguments = function
                        .get("arguments")
                        .and_then(|v| v.as_str())
                        .and_then(|s| {
                            serde_json::from_str::<HashMap<String, serde_json::Value>>(s).ok()
                        })
                        .unwrap_or_default();
                    Some(ToolCallRequest {
                        id,
                        name,
                        arguments,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let mut usage = HashMap::new();
    if let Some(u) = data.get("usage").and_then(|v| v.as_object()) {
        for (key, value) in u {
            if let Some(n) = value.as_i64() {
                usage.insert(key.clone(), n);
            }
        }
    }

    LLMResponse {
        content,
        tool_calls,
        finish_reason,
        usage,
    }
}
