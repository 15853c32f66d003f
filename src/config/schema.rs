//! Configuration schema for voxbot.
//!
//! All structs use `#[serde(rename_all = "camelCase")]` so that the JSON
//! config file can use camelCase keys while Rust code uses snake_case fields.
//! Every credential is optional; the owning pipeline degrades gracefully when
//! its key is absent. Only the gateway password is required to serve traffic.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Shared access password. Empty means the auth endpoint reports
    /// "not configured" and refuses to issue tokens.
    #[serde(default)]
    pub password: String,
    /// HMAC key for session tokens. Empty means a key is derived from the
    /// password at startup.
    #[serde(default)]
    pub token_secret: String,
}

fn default_port() -> u16 {
    8990
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            password: String::new(),
            token_secret: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Orchestrator defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Maximum model-call/tool-call rounds before a final answer is forced.
    #[serde(default = "default_step_budget")]
    pub step_budget: u32,
    /// Override for the built-in assistant persona.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_temperature() -> f64 {
    0.7
}

fn default_step_budget() -> u32 {
    4
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            step_budget: default_step_budget(),
            system_prompt: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// LLM provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// Key-only provider configuration (search, weather, transcription).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyConfig {
    #[serde(default)]
    pub api_key: String,
}

/// Primary TTS provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevenLabsConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_elevenlabs_voice")]
    pub voice_id: String,
}

fn default_elevenlabs_voice() -> String {
    // Rachel, a reliable pre-made voice.
    "21m00Tcm4TlvDq8ikWAM".to_string()
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            voice_id: default_elevenlabs_voice(),
        }
    }
}

/// Secondary TTS provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiSpeechConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_voice")]
    pub voice: String,
}

fn default_openai_voice() -> String {
    "alloy".to_string()
}

impl Default for OpenAiSpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            voice: default_openai_voice(),
        }
    }
}

/// External provider credentials and endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: KeyConfig,
    #[serde(default)]
    pub weather: KeyConfig,
    #[serde(default)]
    pub eleven_labs: ElevenLabsConfig,
    #[serde(default)]
    pub openai_speech: OpenAiSpeechConfig,
    #[serde(default)]
    pub transcription: KeyConfig,
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration object (`~/.voxbot/config.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.gateway.port, 8990);
        assert_eq!(cfg.agent.step_budget, 4);
        assert_eq!(cfg.agent.model, "gpt-4o-mini");
        assert!(cfg.providers.llm.api_key.is_empty());
    }

    #[test]
    fn test_camel_case_roundtrip() {
        let cfg = Config::default();
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("stepBudget"));
        assert!(json.contains("tokenSecret"));
        assert!(json.contains("apiKey"));
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.agent.step_budget, cfg.agent.step_budget);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{"gateway": {"password": "s3cret"}}"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.gateway.password, "s3cret");
        assert_eq!(cfg.gateway.port, 8990);
        assert_eq!(cfg.agent.max_tokens, 512);
        assert_eq!(
            cfg.providers.eleven_labs.voice_id,
            "21m00Tcm4TlvDq8ikWAM"
        );
    }

    #[test]
    fn test_unknown_type_keys_ignored() {
        let json = r#"{"agent": {"model": "gpt-4o", "legacyField": 3}}"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.agent.model, "gpt-4o");
    }
}
