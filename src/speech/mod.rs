//! Speech pipelines: outbound synthesis and inbound transcription.
//!
//! Both pipelines share the same degradation contract: provider trouble is
//! never a transport error. Exhausting the remote options emits a
//! [`FallbackSignal`], an HTTP-200 `fallback: true` body, telling the
//! caller to use its client-local alternative.

pub mod synthesis;
pub mod transcribe;

use serde::Serialize;

/// Structured signal directing the caller to a local/degraded alternative.
#[derive(Debug, Clone, Serialize)]
pub struct FallbackSignal {
    pub error: String,
    pub message: String,
}

impl FallbackSignal {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }

    /// The JSON body shape every degraded speech response uses.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.error,
            "fallback": true,
            "message": self.message,
        })
    }
}
