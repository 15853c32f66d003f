//! CLI subcommand handlers.
//!
//! Functions live here to keep `main.rs` focused on argument parsing and
//! routing. Adapters are constructed once per invocation and injected into
//! the gateway/orchestrator; nothing holds module-scope client state.

use std::path::Path;

use crate::agent::orchestrator::ChatMessage;
use crate::config::loader::{get_config_path, load_config, save_config};
use crate::config::schema::Config;
use crate::gateway::{build_state, run_gateway};

/// Initialize the voxbot configuration file.
pub fn cmd_onboard() {
    let path = get_config_path();
    if path.exists() {
        println!("Config already exists at {}", path.display());
    } else {
        save_config(&Config::default(), Some(&path));
        println!("Wrote default config to {}", path.display());
    }

    println!();
    println!("Set the gateway password in the config file (gateway.password)");
    println!("or via the VOXBOT_PASSWORD environment variable.");
    println!();
    println!("Optional provider credentials (config or environment):");
    println!("  OPENAI_API_KEY      chat completions, secondary TTS, transcription");
    println!("  EXA_API_KEY         neural web search");
    println!("  WEATHERAPI_KEY      weather reports");
    println!("  ELEVENLABS_API_KEY  primary TTS");
    println!();
    println!("Every pipeline degrades gracefully when its credential is absent.");
}

/// Run the HTTP gateway.
pub async fn cmd_gateway(port: Option<u16>, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path);
    let port = port.unwrap_or(config.gateway.port);

    if config.gateway.password.is_empty() {
        eprintln!(
            "warning: no gateway password configured; /auth will refuse to issue tokens. \
             Set gateway.password or VOXBOT_PASSWORD."
        );
    }

    let state = build_state(&config);
    run_gateway(state, port).await
}

/// One-shot orchestrator run from the terminal.
pub async fn cmd_chat(message: &str, config_path: Option<&Path>) {
    let config = load_config(config_path);
    let state = build_state(&config);

    let history = vec![ChatMessage {
        role: "user".to_string(),
        content: message.to_string(),
    }];
    let reply = state.orchestrator.run(&history).await;

    if !reply.tool_usage.tool_calls.is_empty() {
        let tools: Vec<&str> = reply
            .tool_usage
            .tool_calls
            .iter()
            .map(|c| c.tool.as_str())
            .collect();
        eprintln!(
            "[{} steps, tools: {}]",
            reply.tool_usage.total_steps,
            tools.join(", ")
        );
    }
    println!("{}", reply.response);
}

/// Show configuration status.
pub fn cmd_status(config_path: Option<&Path>) {
    let config = load_config(config_path);
    let path = config_path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(get_config_path);

    let flag = |configured: bool| if configured { "configured" } else { "missing" };

    println!("voxbot status");
    println!("  config:        {}", path.display());
    println!("  gateway port:  {}", config.gateway.port);
    println!("  password:      {}", flag(!config.gateway.password.is_empty()));
    println!("  model:         {}", config.agent.model);
    println!("  step budget:   {}", config.agent.step_budget);
    println!("  llm key:       {}", flag(!config.providers.llm.api_key.is_empty()));
    println!("  search key:    {}", flag(!config.providers.search.api_key.is_empty()));
    println!("  weather key:   {}", flag(!config.providers.weather.api_key.is_empty()));
    println!(
        "  tts primary:   {}",
        flag(!config.providers.eleven_labs.api_key.is_empty())
    );
    println!(
        "  tts secondary: {}",
        flag(!config.providers.openai_speech.api_key.is_empty())
    );
    println!(
        "  transcription: {}",
        flag(!config.providers.transcription.api_key.is_empty())
    );
}
