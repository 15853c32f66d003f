//! Voice transcription provider (Whisper-style API).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use crate::errors::ProviderError;

/// Per-request timeout for transcription calls.
const TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(60);

/// A transcription result.
///
/// `confidence` is a constant 1.0 sentinel when the provider does not
/// report one (Whisper does not).
#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    pub confidence: f64,
}

/// Abstract interface for a speech-to-text provider.
#[async_trait]
pub trait Transcription: Send + Sync {
    /// Whether a credential is present.
    fn is_configured(&self) -> bool;

    /// Transcribe an audio payload. `file_name` and `mime` describe the
    /// container the provider should assume.
    async fn transcribe(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime: &str,
    ) -> Result<Transcript, ProviderError>;
}

/// Whisper transcription over the OpenAI audio API.
pub struct WhisperTranscriptionProvider {
    api_key: String,
    api_url: String,
    client: Client,
}

impl WhisperTranscriptionProvider {
    /// Create a new transcription provider.
    ///
    /// If `api_key` is `None`, the `OPENAI_API_KEY` environment variable is
    /// checked at construction time.
    pub fn new(api_key: Option<String>) -> Self {
        let resolved_key = match api_key {
            Some(key) => key,
            None => std::env::var("OPENAI_API_KEY").unwrap_or_default(),
        };

        Self {
            api_key: resolved_key,
            api_url: "https://api.openai.com/v1/audio/transcriptions".to_string(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Transcription for WhisperTranscriptionProvider {
    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn transcribe(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime: &str,
    ) -> Result<Transcript, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured);
        }

        let file_part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|e| ProviderError::BadRequest {
                status: 0,
                message: format!("invalid mime type: {}", e),
            })?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", "whisper-1")
            .text("language", "en")
            .text("response_format", "json")
            .text("temperature", "0.2");

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .timeout(TRANSCRIBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Transcription provider returned HTTP {}: {}", status, body);
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let text = data
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        Ok(Transcript {
            text,
            confidence: 1.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_without_key() {
        let provider = WhisperTranscriptionProvider::new(Some(String::new()));
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn test_transcribe_without_key_errors() {
        let provider = WhisperTranscriptionProvider::new(Some(String::new()));
        let result = provider
            .transcribe(vec![0u8; 2000], "recording.mp4", "audio/mp4")
            .await;
        assert!(matches!(result, Err(ProviderError::NotConfigured)));
    }
}
