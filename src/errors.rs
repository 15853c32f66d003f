//! Domain error types for voxbot.
//!
//! Typed errors at module boundaries replace string-encoded errors and
//! enable structured error handling via pattern matching.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Provider errors
// ---------------------------------------------------------------------------

/// Errors from external provider operations (LLM, search, weather, TTS, STT).
///
/// Embedded in `anyhow::Error` where a trait signature stays `anyhow::Result`
/// so callers can downcast: `e.downcast_ref::<ProviderError>()`.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider credential not configured")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Failed to read response body: {0}")]
    ResponseReadError(String),

    #[error("Failed to parse provider response: {0}")]
    ParseError(String),

    #[error("Rate limited (status {status}): retry after {retry_after_ms}ms")]
    RateLimited { status: u16, retry_after_ms: u64 },

    #[error("Authentication failed (status {status}): {message}")]
    AuthError { status: u16, message: String },

    #[error("Provider rejected request (status {status}): {message}")]
    BadRequest { status: u16, message: String },

    #[error("Server error (status {status}): {message}")]
    ServerError { status: u16, message: String },
}

impl ProviderError {
    /// Build the matching variant from an HTTP status and response body.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => ProviderError::AuthError {
                status,
                message: body,
            },
            429 => ProviderError::RateLimited {
                status,
                retry_after_ms: 1000,
            },
            400..=499 => ProviderError::BadRequest {
                status,
                message: body,
            },
            _ => ProviderError::ServerError {
                status,
                message: body,
            },
        }
    }

    /// Client-error-class failures (bad credential, malformed/unsupported
    /// input). The speech pipelines map these to a fallback signal rather
    /// than a hard error.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ProviderError::NotConfigured
                | ProviderError::AuthError { .. }
                | ProviderError::BadRequest { .. }
        )
    }

    /// Transient failures worth retrying with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::HttpError(_)
                | ProviderError::RateLimited { .. }
                | ProviderError::ServerError { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Tool error classification
// ---------------------------------------------------------------------------

/// Categorised tool failure reasons.
///
/// Produced by [`classify_tool_error`] from the error string that tools
/// return via the `"Error: ..."` prefix convention.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolErrorKind {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Classify a tool error string into a structured [`ToolErrorKind`].
///
/// Matches on known substrings in the error message. Returns `None` for
/// unrecognised patterns (the caller still has the raw string).
pub fn classify_tool_error(error_msg: &str) -> Option<ToolErrorKind> {
    let lower = error_msg.to_lowercase();

    if lower.contains("unknown tool") || lower.contains("tool not found") {
        return Some(ToolErrorKind::ToolNotFound(error_msg.to_string()));
    }

    if lower.contains("invalid")
        || lower.contains("missing required")
        || lower.contains("parameter is required")
    {
        return Some(ToolErrorKind::InvalidArgs(error_msg.to_string()));
    }

    if lower.contains("not configured") || lower.contains("unavailable") {
        return Some(ToolErrorKind::ProviderUnavailable(error_msg.to_string()));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let e = ProviderError::HttpError("connection refused".into());
        assert_eq!(e.to_string(), "HTTP request failed: connection refused");
    }

    #[test]
    fn test_provider_error_rate_limited() {
        let e = ProviderError::RateLimited {
            status: 429,
            retry_after_ms: 5000,
        };
        assert!(e.to_string().contains("429"));
        assert!(e.to_string().contains("5000"));
    }

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(
            ProviderError::from_status(401, String::new()),
            ProviderError::AuthError { .. }
        ));
        assert!(matches!(
            ProviderError::from_status(429, String::new()),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            ProviderError::from_status(400, String::new()),
            ProviderError::BadRequest { .. }
        ));
        assert!(matches!(
            ProviderError::from_status(503, String::new()),
            ProviderError::ServerError { .. }
        ));
    }

    #[test]
    fn test_client_error_classes() {
        assert!(ProviderError::NotConfigured.is_client_error());
        assert!(ProviderError::BadRequest {
            status: 400,
            message: "bad audio".into()
        }
        .is_client_error());
        assert!(!ProviderError::ServerError {
            status: 500,
            message: "boom".into()
        }
        .is_client_error());
        assert!(!ProviderError::HttpError("timeout".into()).is_client_error());
    }

    #[test]
    fn test_retryable_classes() {
        assert!(ProviderError::ServerError {
            status: 503,
            message: "overloaded".into()
        }
        .is_retryable());
        assert!(ProviderError::HttpError("reset".into()).is_retryable());
        assert!(!ProviderError::AuthError {
            status: 401,
            message: "bad key".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_provider_error_downcast() {
        let anyhow_err: anyhow::Error = ProviderError::AuthError {
            status: 401,
            message: "invalid key".into(),
        }
        .into();
        let downcasted = anyhow_err.downcast_ref::<ProviderError>();
        assert!(downcasted.is_some());
        assert!(matches!(
            downcasted.unwrap(),
            ProviderError::AuthError { status: 401, .. }
        ));
    }

    #[test]
    fn test_classify_tool_not_found() {
        let kind = classify_tool_error("Tool not found: magic_wand");
        assert!(matches!(kind, Some(ToolErrorKind::ToolNotFound(_))));
    }

    #[test]
    fn test_classify_invalid_args() {
        let kind = classify_tool_error("'query' parameter is required");
        assert!(matches!(kind, Some(ToolErrorKind::InvalidArgs(_))));
    }

    #[test]
    fn test_classify_not_configured() {
        let kind = classify_tool_error("EXA_API_KEY not configured");
        assert!(matches!(kind, Some(ToolErrorKind::ProviderUnavailable(_))));
    }

    #[test]
    fn test_classify_unknown_error() {
        assert_eq!(classify_tool_error("something odd happened"), None);
    }

    #[test]
    fn test_classify_case_insensitive() {
        let kind = classify_tool_error("Weather service UNAVAILABLE right now");
        assert!(matches!(kind, Some(ToolErrorKind::ProviderUnavailable(_))));
    }
}
