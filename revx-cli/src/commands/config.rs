//! Settings command handlers
//!
//! Explicit load/save boundaries: every subcommand reads the file, applies
//! its change, and writes it back. Nothing holds settings in ambient state.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use revx_core::settings::Settings;

/// Settings subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the persisted settings
    Show,
    /// Print the settings file location
    Path,
    /// Set one or more settings fields
    Set {
        /// Patch engine jar
        #[arg(long)]
        engine: Option<PathBuf>,

        /// Patch bundle file
        #[arg(long)]
        patches: Option<PathBuf>,

        /// Application package
        #[arg(long)]
        apk: Option<PathBuf>,

        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Java runtime
        #[arg(long)]
        java: Option<PathBuf>,

        /// Use the engine's default patch selection (true/false)
        #[arg(long)]
        default_selection: Option<bool>,
    },
    /// Reset all settings to their defaults
    Reset,
}

/// Handle config commands
pub fn handle_config_command(command: ConfigCommands, settings_path: &Path) -> Result<()> {
    match command {
        ConfigCommands::Show => show(settings_path),
        ConfigCommands::Path => {
            println!("{}", settings_path.display());
            Ok(())
        }
        ConfigCommands::Set {
            engine,
            patches,
            apk,
            output,
            java,
            default_selection,
        } => set(
            settings_path,
            engine,
            patches,
            apk,
            output,
            java,
            default_selection,
        ),
        ConfigCommands::Reset => reset(settings_path),
    }
}

fn show(settings_path: &Path) -> Result<()> {
    let settings = Settings::load(settings_path)?;

    println!("{}", "Settings:".bold());
    print_path_field("Engine jar", settings.engine_jar.as_deref());
    print_path_field("Patch bundle", settings.patches_bundle.as_deref());
    print_path_field("Package", settings.input_apk.as_deref());
    println!("  Output dir:        {}", settings.output_dir.display());
    println!("  Default selection: {}", settings.use_default_selection);
    println!("  Java runtime:      {}", settings.java.display());

    if let Err(e) = settings.validate() {
        println!();
        println!("{} {}", "⚠".yellow(), e.to_string().yellow());
    }

    Ok(())
}

fn print_path_field(label: &str, value: Option<&Path>) {
    let label = format!("{label}:");
    match value {
        Some(path) => println!("  {:<18} {}", label, path.display()),
        None => println!("  {:<18} {}", label, "(not set)".dimmed()),
    }
}

fn set(
    settings_path: &Path,
    engine: Option<PathBuf>,
    patches: Option<PathBuf>,
    apk: Option<PathBuf>,
    output: Option<PathBuf>,
    java: Option<PathBuf>,
    default_selection: Option<bool>,
) -> Result<()> {
    let mut settings = Settings::load(settings_path)?;

    if let Some(path) = engine {
        settings.engine_jar = Some(path);
    }
    if let Some(path) = patches {
        settings.patches_bundle = Some(path);
    }
    if let Some(path) = apk {
        settings.input_apk = Some(path);
    }
    if let Some(path) = output {
        settings.output_dir = path;
    }
    if let Some(path) = java {
        settings.java = path;
    }
    if let Some(auto) = default_selection {
        settings.use_default_selection = auto;
    }

    if let Err(e) = settings.validate() {
        println!("{} {}", "⚠".yellow(), e.to_string().yellow());
    }

    settings
        .save(settings_path)
        .with_context(|| format!("failed to save settings to {}", settings_path.display()))?;
    println!("{}", "Settings saved.".green());

    Ok(())
}

fn reset(settings_path: &Path) -> Result<()> {
    Settings::default()
        .save(settings_path)
        .with_context(|| format!("failed to save settings to {}", settings_path.display()))?;
    println!("{}", "Settings reset to defaults.".green());

    Ok(())
}
