//! Weather tool over the WeatherAPI adapter.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::base::{Tool, ToolOutcome};
use crate::errors::ProviderError;
use crate::providers::weather::{format_weather_report, ReportType, WeatherApiProvider};

/// Get the weather for a location.
///
/// Provider failures never propagate: missing configuration and HTTP
/// failures come back as explanatory text so the orchestration run keeps
/// going.
pub struct WeatherTool {
    provider: Arc<WeatherApiProvider>,
}

impl WeatherTool {
    pub fn new(provider: Arc<WeatherApiProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Get the weather for the given location."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The location to get the weather for."
                },
                "type": {
                    "type": "string",
                    "enum": ["current", "forecast", "astronomy"],
                    "description": "The type of weather report to get."
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
        let report_type = ReportType::parse(params.get("type").and_then(|v| v.as_str()));

        match self.provider.fetch(query, report_type).await {
            Ok(data) => {
                let formatted = format_weather_report(&data, report_type);
                ToolOutcome::Structured {
                    value: serde_json::json!({
                        "success": true,
                        "data": data,
                        "formatted": formatted,
                        "type": report_type.as_str(),
                    }),
                    formatted,
                }
            }
            Err(ProviderError::NotConfigured) => ToolOutcome::Text(
                "Weather service is not configured. Add a WeatherAPI key to the \
                 configuration for weather data."
                    .to_string(),
            ),
            Err(e) => {
                warn!("Weather lookup failed for {:?}: {}", query, e);
                ToolOutcome::Text(
                    "Weather service is temporarily unavailable. Please try again later."
                        .to_string(),
                )
            }
        }
    }
}
