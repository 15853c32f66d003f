//! HTTP gateway: axum router and shared application state.

pub mod routes;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use reqwest::Client;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::agent::orchestrator::Orchestrator;
use crate::agent::tools::creator::CreatorInfoTool;
use crate::agent::tools::papers::PaperLookupTool;
use crate::agent::tools::registry::ToolRegistry;
use crate::agent::tools::search::SearchTool;
use crate::agent::tools::weather::WeatherTool;
use crate::auth::AuthGate;
use crate::config::schema::Config;
use crate::providers::openai_compat::OpenAICompatProvider;
use crate::providers::search::ExaSearchProvider;
use crate::providers::speech::{ElevenLabsSpeech, OpenAISpeech, SpeechSynthesis};
use crate::providers::transcription::WhisperTranscriptionProvider;
use crate::providers::weather::WeatherApiProvider;
use crate::speech::synthesis::SpeechPipeline;
use crate::speech::transcribe::TranscribePipeline;

/// Multipart uploads must clear the 25MB validation gate, not the body cap.
const BODY_LIMIT_BYTES: usize = 30 * 1024 * 1024;

/// Shared application state: every adapter constructed once at startup and
/// injected by reference. No global clients, no per-request construction.
pub struct AppState {
    pub auth: AuthGate,
    pub orchestrator: Orchestrator,
    pub search: SearchTool,
    pub weather: Arc<WeatherApiProvider>,
    pub speech: SpeechPipeline,
    pub transcribe: TranscribePipeline,
}

/// Build the full application state from configuration.
pub fn build_state(config: &Config) -> AppState {
    let llm: Arc<dyn crate::providers::base::LLMProvider> = Arc::new(OpenAICompatProvider::new(
        &config.providers.llm.api_key,
        config.providers.llm.api_base.as_deref(),
        Some(&config.agent.model),
    ));
    let search_provider = Arc::new(ExaSearchProvider::new(Some(
        config.providers.search.api_key.clone(),
    )));
    let weather_provider = Arc::new(WeatherApiProvider::new(Some(
        config.providers.weather.api_key.clone(),
    )));
    let shared_client = Arc::new(Client::new());

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(SearchTool::new(
        Arc::clone(&search_provider),
        Arc::clone(&llm),
    )));
    registry.register(Box::new(WeatherTool::new(Arc::clone(&weather_provider))));
    registry.register(Box::new(CreatorInfoTool));
    registry.register(Box::new(PaperLookupTool::new(Arc::clone(&shared_client))));

    let orchestrator = Orchestrator::new(
        Arc::clone(&llm),
        Arc::new(registry),
        Some(config.agent.model.clone()),
        config.agent.max_tokens,
        config.agent.temperature,
        config.agent.step_budget,
        config.agent.system_prompt.clone(),
    );

    let engines: Vec<Arc<dyn SpeechSynthesis>> = vec![
        Arc::new(ElevenLabsSpeech::new(
            Some(config.providers.eleven_labs.api_key.clone()),
            &config.providers.eleven_labs.voice_id,
        )),
        Arc::new(OpenAISpeech::new(
            Some(config.providers.openai_speech.api_key.clone()),
            &config.providers.openai_speech.voice,
        )),
    ];

    AppState {
        auth: AuthGate::new(&config.gateway.password, &config.gateway.token_secret),
        orchestrator,
        search: SearchTool::new(search_provider, llm),
        weather: weather_provider,
        speech: SpeechPipeline::new(engines),
        transcribe: TranscribePipeline::new(Arc::new(WhisperTranscriptionProvider::new(Some(
            config.providers.transcription.api_key.clone(),
        )))),
    }
}

/// Build the axum router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/auth", post(routes::auth))
        .route("/chat", post(routes::chat))
        .route("/search", post(routes::search))
        .route("/weather", post(routes::weather))
        .route("/speech", post(routes::speech))
        .route("/transcribe", post(routes::transcribe))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve the gateway until the process exits.
pub async fn run_gateway(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("voxbot gateway listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
