//! voxbot - a voice-enabled assistant gateway.
//!
//! Proxies chat turns to a hosted completion provider with a bounded tool
//! menu (search, weather, papers, creator info), and fronts speech
//! synthesis/transcription providers with layered fallback.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use voxbot::cli;

#[derive(Parser)]
#[command(name = "voxbot", about = "voxbot - voice assistant gateway", version)]
struct Cli {
    /// Path to an alternate config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize voxbot configuration.
    Onboard,
    /// Start the HTTP gateway.
    Gateway {
        /// Port override (defaults to the configured port).
        #[arg(short, long)]
        port: Option<u16>,
        /// Verbose logging.
        #[arg(short, long)]
        verbose: bool,
    },
    /// Send one message through the orchestrator and print the reply.
    Chat {
        /// Message to send.
        #[arg(short, long)]
        message: String,
    },
    /// Show configuration status.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Gateway { verbose: true, .. });
    let default_filter = if verbose { "voxbot=debug,info" } else { "voxbot=info,warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Onboard => cli::cmd_onboard(),
        Commands::Gateway { port, .. } => cli::cmd_gateway(port, config_path).await?,
        Commands::Chat { message } => cli::cmd_chat(&message, config_path).await,
        Commands::Status => cli::cmd_status(config_path),
    }

    Ok(())
}
