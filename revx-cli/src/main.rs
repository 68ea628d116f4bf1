//! revx
//!
//! Terminal front-end for an external APK patch engine. Collects the engine
//! jar, patch bundle, input package, and output directory, launches the
//! engine as a child process, and relays its output live.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "revx")]
#[command(about = "Patch Android packages with an external patch engine", long_about = None)]
struct Cli {
    /// Settings file location
    #[arg(long, env = "REVX_SETTINGS", global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "revx_runner=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings_path = cli
        .settings
        .unwrap_or_else(revx_core::settings::default_path);

    handle_command(cli.command, &settings_path).await
}
