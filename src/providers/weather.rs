//! Weather data provider (WeatherAPI.com) and report formatting.

use std::time::Duration;

use reqwest::Client;
use tracing::warn;

use crate::errors::ProviderError;

/// Per-request timeout for weather calls.
const WEATHER_TIMEOUT: Duration = Duration::from_secs(10);

/// Kind of weather report to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    Current,
    Forecast,
    Astronomy,
}

impl ReportType {
    /// Parse from the request field. Unknown or absent values default to
    /// `Current`.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("forecast") => ReportType::Forecast,
            Some("astronomy") => ReportType::Astronomy,
            _ => ReportType::Current,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Current => "current",
            ReportType::Forecast => "forecast",
            ReportType::Astronomy => "astronomy",
        }
    }

    fn endpoint(&self) -> &'static str {
        match self {
            ReportType::Current => "current.json",
            ReportType::Forecast => "forecast.json",
            ReportType::Astronomy => "astronomy.json",
        }
    }
}

/// Weather provider backed by the WeatherAPI.com REST service.
pub struct WeatherApiProvider {
    api_key: String,
    api_base: String,
    client: Client,
}

impl WeatherApiProvider {
    /// Create a new weather provider.
    ///
    /// If `api_key` is `None`, the `WEATHERAPI_KEY` environment variable is
    /// checked at construction time.
    pub fn new(api_key: Option<String>) -> Self {
        let resolved_key = match api_key {
            Some(key) => key,
            None => std::env::var("WEATHERAPI_KEY").unwrap_or_default(),
        };

        Self {
            api_key: resolved_key,
            api_base: "http://api.weatherapi.com/v1".to_string(),
            client: Client::new(),
        }
    }

    /// Override the API base URL (tests point this at a stub or closed port).
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    /// Whether a credential is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Fetch the raw provider payload for a location query.
    pub async fn fetch(
        &self,
        query: &str,
        report_type: ReportType,
    ) -> Result<serde_json::Value, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured);
        }

        let url = format!("{}/{}", self.api_base, report_type.endpoint());
        let mut params: Vec<(&str, String)> = vec![
            ("key", self.api_key.clone()),
            ("q", query.to_string()),
            ("aqi", "yes".to_string()),
        ];
        if report_type == ReportType::Forecast {
            params.push(("days", "3".to_string()));
            params.push(("alerts", "yes".to_string()));
        }

        let response = self
            .client
            .get(&url)
            .query(&params)
            .timeout(WEATHER_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Weather provider returned HTTP {}: {}", status, body);
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

/// Format a provider payload into a one-paragraph human-readable summary.
///
/// Temperatures and wind speeds are rounded to whole numbers. Missing fields
/// degrade to a generic "data retrieved" line rather than erroring.
pub fn format_weather_report(data: &serde_json::Value, report_type: ReportType) -> String {
    let location_name = data
        .pointer("/location/name")
        .and_then(|v| v.as_str())
        .unwrap_or("the requested location");
    let region = data
        .pointer("/location/region")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    match report_type {
        ReportType::Current => {
            let current = match data.get("current") {
                Some(c) => c,
                None => {
                    return format!("Weather data retrieved for {}, {}.", location_name, region)
                }
            };
            let condition = current
                .pointer("/condition/text")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown conditions");
            let temp = round_f64(current.get("temp_c"));
            let feels_like = round_f64(current.get("feelslike_c"));
            let humidity = current.get("humidity").and_then(|v| v.as_i64()).unwrap_or(0);
            let wind = round_f64(current.get("wind_kph"));
            let wind_dir = current
                .get("wind_dir")
                .and_then(|v| v.as_str())
                .unwrap_or("N");

            format!(
                "Current weather in {}, {}: {}. Temperature {}°C, feels like {}°C. \
                 Humidity {}%, wind speed {} km/h from the {}.",
                location_name, region, condition, temp, feels_like, humidity, wind, wind_dir
            )
        }
        ReportType::Forecast => {
            let days = match data
                .pointer("/forecast/forecastday")
                .and_then(|v| v.as_array())
            {
                Some(days) if !days.is_empty() => days,
                _ => {
                    return format!("Weather data retrieved for {}, {}.", location_name, region)
                }
            };

            let today = &days[0]["day"];
            let mut response = format!(
                "Weather forecast for {}, {}: Today will be {} with highs of {}°C and lows of {}°C.",
                location_name,
                region,
                today
                    .pointer("/condition/text")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_lowercase(),
                round_f64(today.get("maxtemp_c")),
                round_f64(today.get("mintemp_c")),
            );

            if let Some(tomorrow) = days.get(1).map(|d| &d["day"]) {
                response.push_str(&format!(
                    " Tomorrow expects {} with temperatures between {}°C and {}°C.",
                    tomorrow
                        .pointer("/condition/text")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown")
                        .to_lowercase(),
                    round_f64(tomorrow.get("mintemp_c")),
                    round_f64(tomorrow.get("maxtemp_c")),
                ));
            }

            response
        }
        ReportType::Astronomy => {
            let astro = match data.pointer("/astronomy/astro") {
                Some(a) => a,
                None => {
                    return format!("Weather data retrieved for {}, {}.", location_name, region)
                }
            };
            format!(
                "Astronomy data for {}: Sunrise at {}, sunset at {}. Moon phase: {} with {}% illumination.",
                location_name,
                astro.get("sunrise").and_then(|v| v.as_str()).unwrap_or("unknown"),
                astro.get("sunset").and_then(|v| v.as_str()).unwrap_or("unknown"),
                astro.get("moon_phase").and_then(|v| v.as_str()).unwrap_or("unknown"),
                astro
                    .get("moon_illumination")
                    .and_then(|v| v.as_str().map(String::from).or_else(|| v.as_i64().map(|n| n.to_string())))
                    .unwrap_or_else(|| "0".to_string()),
            )
        }
    }
}

fn round_f64(value: Option<&serde_json::Value>) -> i64 {
    value
        .and_then(|v| v.as_f64())
        .map(|f| f.round() as i64)
        .unwrap_or(0)
}
