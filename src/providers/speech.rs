//! Text-to-speech provider adapters.
//!
//! Two remote engines share the [`SpeechSynthesis`] trait: an
//! ElevenLabs-style primary and an OpenAI-style secondary. The outbound
//! speech pipeline walks them in preference order and emits a fallback
//! signal when both fail.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use crate::errors::ProviderError;

/// Per-request timeout for synthesis calls.
const SPEECH_TIMEOUT: Duration = Duration::from_secs(30);

/// Character cap accepted by the OpenAI speech endpoint.
pub const OPENAI_SPEECH_MAX_CHARS: usize = 4096;

/// Synthesized audio plus its media type.
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Abstract interface for a remote TTS engine.
#[async_trait]
pub trait SpeechSynthesis: Send + Sync {
    /// Engine name for logs and fallback messages.
    fn name(&self) -> &str;

    /// Whether a credential is present.
    fn is_configured(&self) -> bool;

    /// Maximum input length the engine accepts, if bounded.
    fn max_text_len(&self) -> Option<usize> {
        None
    }

    /// Synthesize `text` into audio bytes.
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, ProviderError>;
}

/// Truncate text to an engine's accepted length on a char boundary.
pub fn clip_to_limit(text: &str, limit: Option<usize>) -> &str {
    match limit {
        Some(max) if text.len() > max => {
            let mut end = max;
            while end > 0 && !text.is_char_boundary(end) {
                end -= 1;
            }
            &text[..end]
        }
        _ => text,
    }
}

// ---------------------------------------------------------------------------
// ElevenLabs (primary)
// ---------------------------------------------------------------------------

/// Primary TTS engine: ElevenLabs text-to-speech.
pub struct ElevenLabsSpeech {
    api_key: String,
    voice_id: String,
    api_base: String,
    client: Client,
}

impl ElevenLabsSpeech {
    /// Create a new adapter.
    ///
    /// If `api_key` is `None`, the `ELEVENLABS_API_KEY` environment variable
    /// is checked at construction time.
    pub fn new(api_key: Option<String>, voice_id: &str) -> Self {
        let resolved_key = match api_key {
            Some(key) => key,
            None => std::env::var("ELEVENLABS_API_KEY").unwrap_or_default(),
        };

        Self {
            api_key: resolved_key,
            voice_id: voice_id.to_string(),
            api_base: "https://api.elevenlabs.io/v1".to_string(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SpeechSynthesis for ElevenLabsSpeech {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured);
        }

        let url = format!("{}/text-to-speech/{}", self.api_base, self.voice_id);
        let body = serde_json::json!({
            "text": text,
            "model_id": "eleven_monolingual_v1",
            "voice_settings": {"stability": 0.5, "similarity_boost": 0.5}
        });

        let response = self
            .client
            .post(&url)
            .header("Accept", "audio/mpeg")
            .header("Content-Type", "application/json")
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .timeout(SPEECH_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("ElevenLabs returned HTTP {}: {}", status, body);
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::ResponseReadError(e.to_string()))?;

        Ok(SpeechAudio {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

// ---------------------------------------------------------------------------
// OpenAI speech (secondary)
// ---------------------------------------------------------------------------

/// Secondary TTS engine: OpenAI `audio/speech` (tts-1).
pub struct OpenAISpeech {
    api_key: String,
    voice: String,
    api_base: String,
    client: Client,
}

impl OpenAISpeech {
    /// Create a new adapter.
    ///
    /// If `api_key` is `None`, the `OPENAI_API_KEY` environment variable is
    /// checked at construction time.
    pub fn new(api_key: Option<String>, voice: &str) -> Self {
        let resolved_key = match api_key {
            Some(key) => key,
            None => std::env::var("OPENAI_API_KEY").unwrap_or_default(),
        };

        Self {
            api_key: resolved_key,
            voice: voice.to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SpeechSynthesis for OpenAISpeech {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn max_text_len(&self) -> Option<usize> {
        Some(OPENAI_SPEECH_MAX_CHARS)
    }

    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured);
        }

        let url = format!("{}/audio/speech", self.api_base);
        let body = serde_json::json!({
            "model": "tts-1",
            "voice": self.voice,
            "input": text,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(SPEECH_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("OpenAI speech returned HTTP {}: {}", status, body);
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::ResponseReadError(e.to_string()))?;

        Ok(SpeechAudio {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_no_limit() {
        let text = "hello world";
        assert_eq!(clip_to_limit(text, None), text);
    }

    #[test]
    fn test_clip_under_limit() {
        assert_eq!(clip_to_limit("short", Some(4096)), "short");
    }

    #[test]
    fn test_clip_over_limit() {
        let long = "a".repeat(5000);
        let clipped = clip_to_limit(&long, Some(OPENAI_SPEECH_MAX_CHARS));
        assert_eq!(clipped.len(), OPENAI_SPEECH_MAX_CHARS);
    }

    #[test]
    fn test_clip_respects_char_boundary() {
        // 'é' is two bytes in UTF-8; a limit landing mid-char must back off.
        let text = "é".repeat(10);
        let clipped = clip_to_limit(&text, Some(5));
        assert_eq!(clipped, "éé");
    }

    #[test]
    fn test_engine_configuration() {
        let el = ElevenLabsSpeech::new(Some(String::new()), "voice");
        assert!(!el.is_configured());
        assert_eq!(el.name(), "elevenlabs");
        assert_eq!(el.max_text_len(), None);

        let oa = OpenAISpeech::new(Some("sk-x".into()), "alloy");
        assert!(oa.is_configured());
        assert_eq!(oa.name(), "openai");
        assert_eq!(oa.max_text_len(), Some(4096));
    }

    #[tokio::test]
    async fn test_synthesize_without_key_errors() {
        let el = ElevenLabsSpeech::new(Some(String::new()), "voice");
        assert!(matches!(
            el.synthesize("hi").await,
            Err(ProviderError::NotConfigured)
        ));

        let oa = OpenAISpeech::new(Some(String::new()), "alloy");
        assert!(matches!(
            oa.synthesize("hi").await,
            Err(ProviderError::NotConfigured)
        ));
    }
}
