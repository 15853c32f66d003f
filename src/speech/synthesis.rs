//! Outbound speech pipeline: text → audio with layered provider fallback.

use std::sync::Arc;

use tracing::{debug, warn};

use super::FallbackSignal;
use crate::providers::speech::{clip_to_limit, SpeechAudio, SpeechSynthesis};

/// Outcome of one synthesis request.
#[derive(Debug, Clone)]
pub enum SynthesisOutcome {
    /// Remote audio, ready to stream to the caller.
    Audio(SpeechAudio),
    /// All remote engines failed; caller should use local synthesis.
    Fallback(FallbackSignal),
    /// Empty/whitespace input: a no-op, not an error.
    Empty,
}

/// The outbound pipeline: an ordered chain of remote TTS engines.
///
/// Engines are attempted in preference order; each attempt gets the input
/// clipped to that engine's accepted length. On exhaustion the caller is
/// signalled to fall back to client-local synthesis; the three-tier
/// cascade (remote A → remote B → local) never leaves the caller without
/// a usable outcome.
pub struct SpeechPipeline {
    engines: Vec<Arc<dyn SpeechSynthesis>>,
}

impl SpeechPipeline {
    pub fn new(engines: Vec<Arc<dyn SpeechSynthesis>>) -> Self {
        Self { engines }
    }

    /// Synthesize `text`, walking the engine chain.
    pub async fn synthesize(&self, text: &str) -> SynthesisOutcome {
        if text.trim().is_empty() {
            return SynthesisOutcome::Empty;
        }

        for engine in &self.engines {
            if !engine.is_configured() {
                debug!("Skipping unconfigured TTS engine {}", engine.name());
                continue;
            }
            let clipped = clip_to_limit(text, engine.max_text_len());
            match engine.synthesize(clipped).await {
                Ok(audio) => {
                    debug!(
                        "TTS engine {} produced {} bytes ({})",
                        engine.name(),
                        audio.bytes.len(),
                        audio.content_type
                    );
                    return SynthesisOutcome::Audio(audio);
                }
                Err(e) => {
                    warn!("TTS engine {} failed: {}; trying next", engine.name(), e);
                }
            }
        }

        SynthesisOutcome::Fallback(FallbackSignal::new(
            "Speech synthesis unavailable",
            "Remote speech services unavailable, falling back to browser speech",
        ))
    }
}
