//! Neural web search provider (Exa API).

use std::time::Duration;

use reqwest::Client;
use tracing::warn;

use crate::errors::ProviderError;

/// Per-request timeout for search calls.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum snippet length taken from full-text content.
const SNIPPET_MAX_CHARS: usize = 500;

/// One retrieved search hit, normalized from the provider payload.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web search provider using Exa's neural search API.
pub struct ExaSearchProvider {
    api_key: String,
    api_url: String,
    client: Client,
}

impl ExaSearchProvider {
    /// Create a new search provider.
    ///
    /// If `api_key` is `None`, the `EXA_API_KEY` environment variable is
    /// checked at construction time.
    pub fn new(api_key: Option<String>) -> Self {
        let resolved_key = match api_key {
            Some(key) => key,
            None => std::env::var("EXA_API_KEY").unwrap_or_default(),
        };

        Self {
            api_key: resolved_key,
            api_url: "https://api.exa.ai/search".to_string(),
            client: Client::new(),
        }
    }

    /// Whether a credential is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Run a neural search returning up to `num_results` hits with content
    /// snippets (highlights preferred, full text truncated otherwise).
    pub async fn search(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured);
        }

        let body = serde_json::json!({
            "query": query,
            "type": "neural",
            "useAutoprompt": true,
            "numResults": num_results,
            "contents": {
                "text": {"maxCharacters": 1000, "includeHtmlTags": false},
                "highlights": {"numSentences": 3, "highlightsPerUrl": 3}
            }
        });

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Search provider returned HTTP {}: {}", status, body);
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let results = data
            .get("results")
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(results
            .iter()
            .take(num_results)
            .map(|item| {
                let highlights: Vec<String> = item
                    .get("highlights")
                    .and_then(|h| h.as_array())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|v| v.as_str().map(String::from))
                            .collect()
                    })
                    .unwrap_or_default();
                let text = item.get("text").and_then(|v| v.as_str());

                SearchHit {
                    title: item
                        .get("title")
                        .and_then(|v| v.as_str())
                        .filter(|s| !s.is_empty())
                        .unwrap_or("Untitled")
                        .to_string(),
                    url: item
                        .get("url")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string(),
                    snippet: build_snippet(&highlights, text),
                }
            })
            .collect())
    }
}

/// Build a content snippet: highlights joined with ellipses when present,
/// otherwise the full text truncated to [`SNIPPET_MAX_CHARS`].
fn build_snippet(highlights: &[String], text: Option<&str>) -> String {
    if !highlights.is_empty() {
        return highlights.join(" ... ");
    }
    match text {
        Some(t) if !t.is_empty() => {
            let mut end = SNIPPET_MAX_CHARS.min(t.len());
            while end < t.len() && !t.is_char_boundary(end) {
                end -= 1;
            }
            let truncated = &t[..end];
            if t.len() > end {
                format!("{}...", truncated)
            } else {
                truncated.to_string()
            }
        }
        _ => "No content available".to_string(),
    }
}

/// Render hits as a numbered source-context block for answer synthesis.
pub fn build_search_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "Source {}: {}\n{}\nURL: {}\n---",
                i + 1,
                hit.title,
                hit.snippet,
                hit.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
