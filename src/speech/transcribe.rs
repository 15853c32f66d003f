//! Inbound speech pipeline: audio → transcript with validation gates.

use std::sync::Arc;

use tracing::{debug, warn};

use super::FallbackSignal;
use crate::providers::transcription::{Transcript, Transcription};

/// Provider upload limit.
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// Below this the recording is likely empty or corrupt.
pub const MIN_AUDIO_BYTES: usize = 1000;

/// Outcome of one transcription request.
#[derive(Debug, Clone)]
pub enum TranscribeOutcome {
    /// A transcript from the remote provider.
    Transcript(Transcript),
    /// Caller should use client-local recognition instead.
    Fallback(FallbackSignal),
    /// Request-level validation failure (missing audio); maps to 400.
    Invalid(String),
}

/// The inbound pipeline around a transcription provider.
///
/// Validation gates run before any provider call; size problems are
/// fallback signals rather than hard errors so the caller can degrade to
/// local recognition. Awkward web-recorder containers are relabeled to a
/// provider-friendly type; the content bytes are unchanged.
pub struct TranscribePipeline {
    provider: Arc<dyn Transcription>,
}

impl TranscribePipeline {
    pub fn new(provider: Arc<dyn Transcription>) -> Self {
        Self { provider }
    }

    /// Transcribe a recorded audio payload.
    pub async fn transcribe(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> TranscribeOutcome {
        if bytes.is_empty() {
            return TranscribeOutcome::Invalid("Audio file is required".to_string());
        }

        if bytes.len() > MAX_AUDIO_BYTES {
            return TranscribeOutcome::Fallback(FallbackSignal::new(
                "Audio file too large",
                "Audio file exceeds 25MB limit, falling back to browser speech recognition",
            ));
        }

        if bytes.len() < MIN_AUDIO_BYTES {
            return TranscribeOutcome::Fallback(FallbackSignal::new(
                "Audio file too small",
                "Audio recording too short, falling back to browser speech recognition",
            ));
        }

        if !self.provider.is_configured() {
            return TranscribeOutcome::Fallback(FallbackSignal::new(
                "Transcription key not configured",
                "Add a transcription API key for remote transcription; falling back to \
                 browser speech recognition",
            ));
        }

        let (file_name, content_type) = normalize_container(file_name, content_type);
        debug!(
            "Transcribing {} bytes as {} ({})",
            bytes.len(),
            file_name,
            content_type
        );

        match self.provider.transcribe(bytes, &file_name, &content_type).await {
            Ok(transcript) => TranscribeOutcome::Transcript(transcript),
            Err(e) if e.is_client_error() => {
                warn!("Transcription rejected: {}", e);
                TranscribeOutcome::Fallback(FallbackSignal::new(
                    "Unsupported audio format",
                    "Audio not accepted by the transcription service, falling back to \
                     browser speech recognition",
                ))
            }
            Err(e) => {
                warn!("Transcription failed: {}", e);
                TranscribeOutcome::Fallback(FallbackSignal::new(
                    "Failed to transcribe audio",
                    "Transcription failed, falling back to browser speech recognition",
                ))
            }
        }
    }
}

/// Relabel web-recorder webm containers as mp4, which the transcription
/// provider handles better. Only the declared type and extension change.
fn normalize_container(file_name: &str, content_type: &str) -> (String, String) {
    if content_type.contains("webm") || file_name.ends_with(".webm") {
        ("recording.mp4".to_string(), "audio/mp4".to_string())
    } else if file_name.is_empty() {
        ("recording.bin".to_string(), content_type.to_string())
    } else {
        (file_name.to_string(), content_type.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingStub {
        configured: bool,
        result: Result<Transcript, ProviderError>,
        calls: AtomicU32,
    }

    impl CountingStub {
        fn ok(text: &str) -> Self {
            Self {
                configured: true,
                result: Ok(Transcript {
                    text: text.to_string(),
                    confidence: 1.0,
                }),
                calls: AtomicU32::new(0),
            }
        }

        fn failing(err: ProviderError) -> Self {
            Self {
                configured: true,
                result: Err(err),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Transcription for CountingStub {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn transcribe(
            &self,
            _bytes: Vec<u8>,
            _file_name: &str,
            _mime: &str,
        ) -> Result<Transcript, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(t) => Ok(t.clone()),
                Err(ProviderError::BadRequest { status, message }) => {
                    Err(ProviderError::BadRequest {
                        status: *status,
                        message: message.clone(),
                    })
                }
                Err(ProviderError::ServerError { status, message }) => {
                    Err(ProviderError::ServerError {
                        status: *status,
                        message: message.clone(),
                    })
                }
                Err(_) => Err(ProviderError::HttpError("stub".into())),
            }
        }
    }

    #[tokio::test]
    async fn test_missing_audio_is_invalid() {
        let stub = Arc::new(CountingStub::ok("hi"));
        let pipeline = TranscribePipeline::new(stub.clone());
        let outcome = pipeline.transcribe(Vec::new(), "a.webm", "audio/webm").await;
        assert!(matches!(outcome, TranscribeOutcome::Invalid(_)));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tiny_audio_is_fallback_without_provider_call() {
        let stub = Arc::new(CountingStub::ok("hi"));
        let pipeline = TranscribePipeline::new(stub.clone());
        let outcome = pipeline
            .transcribe(vec![0u8; 500], "a.webm", "audio/webm")
            .await;
        match outcome {
            TranscribeOutcome::Fallback(signal) => {
                assert!(signal.error.contains("too small"));
            }
            other => panic!("expected fallback, got {:?}", other),
        }
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_audio_is_fallback_without_provider_call() {
        let stub = Arc::new(CountingStub::ok("hi"));
        let pipeline = TranscribePipeline::new(stub.clone());
        let outcome = pipeline
            .transcribe(vec![0u8; MAX_AUDIO_BYTES + 1], "a.wav", "audio/wav")
            .await;
        match outcome {
            TranscribeOutcome::Fallback(signal) => {
                assert!(signal.error.contains("too large"));
            }
            other => panic!("expected fallback, got {:?}", other),
        }
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_returns_transcript_with_confidence() {
        let stub = Arc::new(CountingStub::ok("hello world"));
        let pipeline = TranscribePipeline::new(stub.clone());
        let outcome = pipeline
            .transcribe(vec![0u8; 2000], "a.wav", "audio/wav")
            .await;
        match outcome {
            TranscribeOutcome::Transcript(t) => {
                assert_eq!(t.text, "hello world");
                assert_eq!(t.confidence, 1.0);
            }
            other => panic!("expected transcript, got {:?}", other),
        }
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_client_error_is_format_fallback() {
        let stub = Arc::new(CountingStub::failing(ProviderError::BadRequest {
            status: 400,
            message: "Invalid file format".into(),
        }));
        let pipeline = TranscribePipeline::new(stub);
        let outcome = pipeline
            .transcribe(vec![0u8; 2000], "a.xyz", "audio/xyz")
            .await;
        match outcome {
            TranscribeOutcome::Fallback(signal) => {
                assert!(signal.error.contains("format"));
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_generic_fallback() {
        let stub = Arc::new(CountingStub::failing(ProviderError::ServerError {
            status: 503,
            message: "down".into(),
        }));
        let pipeline = TranscribePipeline::new(stub);
        let outcome = pipeline
            .transcribe(vec![0u8; 2000], "a.wav", "audio/wav")
            .await;
        match outcome {
            TranscribeOutcome::Fallback(signal) => {
                assert_eq!(signal.error, "Failed to transcribe audio");
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_webm_by_type() {
        let (name, mime) = normalize_container("clip.ogg", "audio/webm;codecs=opus");
        assert_eq!(name, "recording.mp4");
        assert_eq!(mime, "audio/mp4");
    }

    #[test]
    fn test_normalize_webm_by_extension() {
        let (name, mime) = normalize_container("clip.webm", "application/octet-stream");
        assert_eq!(name, "recording.mp4");
        assert_eq!(mime, "audio/mp4");
    }

    #[test]
    fn test_normalize_other_formats_untouched() {
        let (name, mime) = normalize_container("clip.wav", "audio/wav");
        assert_eq!(name, "clip.wav");
        assert_eq!(mime, "audio/wav");
    }

    #[test]
    fn test_normalize_missing_name_gets_placeholder() {
        let (name, mime) = normalize_container("", "audio/mp4");
        assert_eq!(name, "recording.bin");
        assert_eq!(mime, "audio/mp4");
    }
}
