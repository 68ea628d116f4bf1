//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod config;
mod doctor;
mod patch;

pub use config::ConfigCommands;
pub use patch::PatchArgs;

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the patch engine against an application package
    Patch(PatchArgs),
    /// Show or edit the persisted settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Check the environment: Java runtime, engine jar, patch bundle
    Doctor,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, settings_path: &Path) -> Result<()> {
    match command {
        Commands::Patch(args) => patch::handle_patch(args, settings_path).await,
        Commands::Config { command } => config::handle_config_command(command, settings_path),
        Commands::Doctor => doctor::handle_doctor(settings_path).await,
    }
}
