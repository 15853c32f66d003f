//! Configuration loading and saving utilities.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::schema::Config;

/// Get the default configuration file path (`~/.voxbot/config.json`).
pub fn get_config_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".voxbot").join("config.json")
}

/// Load configuration from a file, or return a default [`Config`] if the file
/// does not exist or cannot be parsed. Environment overrides are applied on
/// top of whatever was read.
///
/// If `config_path` is `None`, the default path (`~/.voxbot/config.json`) is
/// used.
pub fn load_config(config_path: Option<&Path>) -> Config {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => get_config_path(),
    };

    let mut config = Config::default();

    if path.exists() {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Config>(&contents) {
                Ok(cfg) => config = cfg,
                Err(e) => {
                    warn!(
                        "Failed to parse config from {}: {}. Using default configuration.",
                        path.display(),
                        e
                    );
                }
            },
            Err(e) => {
                warn!(
                    "Failed to read config from {}: {}. Using default configuration.",
                    path.display(),
                    e
                );
            }
        }
    }

    apply_env_overrides(&mut config);
    config
}

/// Fill empty credential fields from the conventional environment variables.
///
/// A value present in the config file always wins; env vars only supply
/// what the file leaves blank. Per-provider env fallback mirrors what the
/// individual adapters accept, so a bare-env deployment needs no file.
pub fn apply_env_overrides(config: &mut Config) {
    fn fill(slot: &mut String, var: &str) {
        if slot.is_empty() {
            if let Ok(val) = std::env::var(var) {
                *slot = val;
            }
        }
    }

    fill(&mut config.gateway.password, "VOXBOT_PASSWORD");
    fill(&mut config.gateway.token_secret, "VOXBOT_TOKEN_SECRET");
    fill(&mut config.providers.llm.api_key, "OPENAI_API_KEY");
    fill(&mut config.providers.search.api_key, "EXA_API_KEY");
    fill(&mut config.providers.weather.api_key, "WEATHERAPI_KEY");
    fill(
        &mut config.providers.eleven_labs.api_key,
        "ELEVENLABS_API_KEY",
    );
    fill(
        &mut config.providers.openai_speech.api_key,
        "OPENAI_API_KEY",
    );
    fill(&mut config.providers.transcription.api_key, "OPENAI_API_KEY");
}

/// Save configuration to a JSON file.
///
/// If `config_path` is `None`, the default path (`~/.voxbot/config.json`) is
/// used. Parent directories are created if they don't exist.
pub fn save_config(config: &Config, config_path: Option<&Path>) {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => get_config_path(),
    };

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    match serde_json::to_string_pretty(config) {
        Ok(json) => {
            if let Err(e) = fs::write(&path, json) {
                warn!("Failed to write config to {}: {}", path.display(), e);
            }
        }
        Err(e) => {
            warn!("Failed to serialize config: {}", e);
        }
    }
}
