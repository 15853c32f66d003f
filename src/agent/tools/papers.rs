//! Academic paper lookup over the arXiv Atom feed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use tracing::warn;

use super::base::{Tool, ToolOutcome};

/// Per-request timeout for feed queries.
const PAPERS_TIMEOUT: Duration = Duration::from_secs(15);

/// Result count bounds.
const DEFAULT_MAX_RESULTS: usize = 5;
const MAX_MAX_RESULTS: usize = 10;

/// One paper entry parsed from the feed.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaperSummary {
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub published: String,
    pub pdf_link: String,
}

/// Look up academic papers by free-text query or arXiv identifier.
///
/// The arXiv export API needs no credential. Transport and parse failures
/// degrade to explanatory text, matching the other tools.
pub struct PaperLookupTool {
    api_url: String,
    client: Arc<Client>,
}

impl PaperLookupTool {
    pub fn new(client: Arc<Client>) -> Self {
        Self {
            api_url: "http://export.arxiv.org/api/query".to_string(),
            client,
        }
    }

    async fn query_feed(&self, query: &str, max_results: usize) -> Result<String, String> {
        let search_param = if looks_like_arxiv_id(query) {
            ("id_list", query.to_string())
        } else {
            ("search_query", format!("all:{}", query))
        };

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                search_param,
                ("start", "0".to_string()),
                ("max_results", max_results.to_string()),
            ])
            .timeout(PAPERS_TIMEOUT)
            .send()
            .await
            .map_err(|e| format!("paper index unreachable: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("paper index returned HTTP {}", status));
        }

        response
            .text()
            .await
            .map_err(|e| format!("failed to read feed: {}", e))
    }
}

/// Recognize a bare arXiv identifier like `2301.00001` or `2301.00001v2`.
fn looks_like_arxiv_id(query: &str) -> bool {
    let core = match query.split_once('.') {
        Some((prefix, rest)) => {
            if prefix.len() != 4 || !prefix.chars().all(|c| c.is_ascii_digit()) {
                return false;
            }
            rest
        }
        None => return false,
    };
    let digits = core.split('v').next().unwrap_or("");
    (4..=5).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
        && core
            .split_once('v')
            .map_or(true, |(_, ver)| !ver.is_empty() && ver.chars().all(|c| c.is_ascii_digit()))
}

/// Collapse runs of whitespace (feed titles carry embedded newlines).
fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse an Atom feed into at most `max_results` paper entries.
pub fn parse_paper_feed(xml: &str, max_results: usize) -> Result<Vec<PaperSummary>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut papers: Vec<PaperSummary> = Vec::new();
    let mut current: Option<PaperSummary> = None;
    let mut in_author = false;
    let mut field: Option<&'static str> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"entry" => {
                    current = Some(PaperSummary {
                        title: String::new(),
                        authors: Vec::new(),
                        summary: String::new(),
                        published: String::new(),
                        pdf_link: String::new(),
                    });
                }
                b"author" => in_author = true,
                b"title" if current.is_some() => field = Some("title"),
                b"summary" if current.is_some() => field = Some("summary"),
                b"published" if current.is_some() => field = Some("published"),
                b"name" if in_author => field = Some("name"),
                _ => field = None,
            },
            Ok(Event::Empty(e)) if e.name().as_ref() == b"link" => {
                if let Some(paper) = current.as_mut() {
                    let mut href = None;
                    let mut is_pdf = false;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"href" => {
                                href = attr.unescape_value().ok().map(|v| v.into_owned());
                            }
                            b"title" => {
                                is_pdf = attr.unescape_value().ok().as_deref() == Some("pdf");
                            }
                            _ => {}
                        }
                    }
                    if is_pdf {
                        if let Some(href) = href {
                            paper.pdf_link = href;
                        }
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(paper), Some(name)) = (current.as_mut(), field) {
                    let text = t.xml_content().map_err(|e| e.to_string())?.into_owned();
                    match name {
                        "title" => paper.title = squash_whitespace(&text),
                        "summary" => paper.summary = squash_whitespace(&text),
                        "published" => paper.published = text,
                        "name" => paper.authors.push(squash_whitespace(&text)),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"entry" => {
                    if let Some(paper) = current.take() {
                        papers.push(paper);
                        if papers.len() >= max_results {
                            break;
                        }
                    }
                }
                b"author" => in_author = false,
                _ => field = None,
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("feed parse error: {}", e)),
            _ => {}
        }
    }

    Ok(papers)
}

/// Render parsed papers as a numbered digest for the model context.
fn format_papers(papers: &[PaperSummary]) -> String {
    papers
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "{}. {} ({})\n   Authors: {}\n   {}",
                i + 1,
                p.title,
                p.published,
                p.authors.join(", "),
                p.summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for PaperLookupTool {
    fn name(&self) -> &str {
        "paper_lookup"
    }

    fn description(&self) -> &str {
        "Look up academic papers by free-text query or arXiv identifier."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search terms or an arXiv identifier."
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum papers to return (1-10).",
                    "minimum": 1,
                    "maximum": 10
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: HashMap<String, serde_json::Value>) -> ToolOutcome {
        let query = match params.get("query").and_then(|v| v.as_str()) {
            Some(q) if !q.trim().is_empty() => q,
            _ => return ToolOutcome::error("'query' parameter is required"),
        };

        let max_results = params
            .get("max_results")
            .and_then(|v| v.as_u64())
            .map(|n| (n as usize).clamp(1, MAX_MAX_RESULTS))
            .unwrap_or(DEFAULT_MAX_RESULTS);

        let xml = match self.query_feed(query, max_results).await {
            Ok(xml) => xml,
            Err(e) => {
                warn!("Paper lookup failed for {:?}: {}", query, e);
                return ToolOutcome::Text(
                    "The paper index is temporarily unavailable. Please try again later."
                        .to_string(),
                );
            }
        };

        let papers = match parse_paper_feed(&xml, max_results) {
            Ok(papers) => papers,
            Err(e) => {
                warn!("Paper feed parse failed for {:?}: {}", query, e);
                return ToolOutcome::Text(
                    "The paper index returned an unreadable response. Please try again later."
                        .to_string(),
                );
            }
        };

        if papers.is_empty() {
            return ToolOutcome::Text(format!("No papers found for \"{}\".", query));
        }

        let formatted = format_papers(&papers);
        ToolOutcome::Structured {
            value: serde_json::json!({
                "papers": serde_json::to_value(&papers).unwrap_or_default(),
            }),
            formatted,
        }
    }
}
