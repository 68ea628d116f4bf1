//! Patch run command
//!
//! Resolves the engine invocation from flags and saved settings, starts the
//! job runner, drains its event queue to the terminal, and prints the
//! completion report. The runner publishes; this module only renders.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::*;
use revx_core::command::PatchCommand;
use revx_core::domain::job::{JobEvent, JobOutcome};
use revx_core::domain::log::{LogLine, StreamSource};
use revx_core::error::{RunnerError, SettingsError};
use revx_core::output::derive_output_path;
use revx_core::settings::Settings;
use revx_runner::{InMemoryLogBuffer, JobRunner, LogBuffer, RunnerConfig};

#[derive(Args)]
pub struct PatchArgs {
    /// Application package to patch
    #[arg(short, long)]
    pub apk: Option<PathBuf>,

    /// Patch engine jar (revanced-cli style)
    #[arg(long)]
    pub engine: Option<PathBuf>,

    /// Patch bundle file (.rvp/.jar)
    #[arg(short, long)]
    pub patches: Option<PathBuf>,

    /// Directory to write the patched package into
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Java runtime used to launch the engine
    #[arg(long)]
    pub java: Option<PathBuf>,

    /// Working directory for the engine process
    #[arg(long)]
    pub working_dir: Option<PathBuf>,

    /// Pick patches manually instead of the engine's default selection
    #[arg(long)]
    pub manual: bool,

    /// Write the captured engine output to this file after completion
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Persist the paths used by this run back to the settings file
    #[arg(long)]
    pub save: bool,
}

pub async fn handle_patch(args: PatchArgs, settings_path: &Path) -> Result<()> {
    let mut settings = Settings::load(settings_path)
        .with_context(|| format!("failed to load settings from {}", settings_path.display()))?;
    apply_overrides(&mut settings, &args);

    let mut command = build_command(&settings)?;
    if let Some(dir) = &args.working_dir {
        command = command.working_dir(dir);
    }

    let buffer = Arc::new(InMemoryLogBuffer::new());
    let runner = Arc::new(JobRunner::with_buffer(
        RunnerConfig::from_env(),
        buffer.clone(),
    ));

    let mut handle = match runner.start(command.invocation()) {
        Ok(handle) => handle,
        Err(e @ RunnerError::ExecutableNotFound { .. }) => {
            return Err(anyhow::Error::new(e)).context(
                "Java was not found. Install a Java runtime and make sure it is on the PATH, \
                 or point --java at one",
            );
        }
        Err(e) => return Err(e.into()),
    };

    // Ctrl-C asks the runner for a best-effort cancellation; the run still
    // ends through the normal Finished event.
    let cancel_runner = Arc::clone(&runner);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupt received, cancelling the patch run...".yellow());
            cancel_runner.cancel();
        }
    });

    let mut final_outcome = None;
    while let Some(event) = handle.events.recv().await {
        match event {
            JobEvent::Started { command_line, .. } => {
                println!("{} {}", "Running:".bold(), command_line.dimmed());
            }
            JobEvent::Line(line) => print_line(&line),
            JobEvent::Finished { outcome, .. } => {
                final_outcome = Some(outcome);
                break;
            }
        }
    }
    let outcome = final_outcome.context("runner ended without reporting a result")?;

    if let Some(path) = &args.log_file {
        flush_log(path, &buffer.snapshot())
            .with_context(|| format!("failed to write log file {}", path.display()))?;
        println!("{}", format!("Log written to {}", path.display()).dimmed());
    }

    if args.save {
        settings
            .save(settings_path)
            .with_context(|| format!("failed to save settings to {}", settings_path.display()))?;
    }

    report(&outcome)
}

/// Flags override whatever was saved
fn apply_overrides(settings: &mut Settings, args: &PatchArgs) {
    if let Some(apk) = &args.apk {
        settings.input_apk = Some(apk.clone());
    }
    if let Some(engine) = &args.engine {
        settings.engine_jar = Some(engine.clone());
    }
    if let Some(patches) = &args.patches {
        settings.patches_bundle = Some(patches.clone());
    }
    if let Some(output) = &args.output {
        settings.output_dir = output.clone();
    }
    if let Some(java) = &args.java {
        settings.java = java.clone();
    }
    if args.manual {
        settings.use_default_selection = false;
    }
}

/// Assembles the engine command, requiring every input to be configured and
/// present on disk, and deriving a collision-free artifact path
fn build_command(settings: &Settings) -> Result<PatchCommand> {
    let engine = settings.engine_jar.clone().ok_or(SettingsError::NotConfigured {
        field: "patch engine jar",
    })?;
    let patches = settings
        .patches_bundle
        .clone()
        .ok_or(SettingsError::NotConfigured {
            field: "patch bundle",
        })?;
    let input = settings.input_apk.clone().ok_or(SettingsError::NotConfigured {
        field: "application package",
    })?;
    settings.validate()?;

    let output = derive_output_path(&input, &settings.output_dir);
    Ok(PatchCommand::new(engine, patches, input, output)
        .java(&settings.java)
        .auto_select(settings.use_default_selection))
}

fn print_line(line: &LogLine) {
    match line.source {
        StreamSource::Stdout => println!("{}", line.text),
        StreamSource::Stderr => println!("{}", line.text.yellow()),
    }
}

fn flush_log(path: &Path, lines: &[LogLine]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    for line in lines {
        writeln!(file, "{}", line.text)?;
    }
    Ok(())
}

/// Prints the completion report and maps the outcome to the process result.
///
/// A failed engine run has already surfaced its full output above, so the
/// returned error stays terse. Cancellation is user-initiated and not an
/// error.
fn report(outcome: &JobOutcome) -> Result<()> {
    println!();
    match outcome {
        JobOutcome::Succeeded { output } => {
            println!("{}", "✓ Patching completed successfully.".green().bold());
            if let Some(path) = output {
                println!("  Output: {}", path.display().to_string().cyan());
            }
            Ok(())
        }
        JobOutcome::Failed { exit_code } => {
            println!(
                "{}",
                format!("✗ Patching finished with exit code {exit_code}.")
                    .red()
                    .bold()
            );
            println!("  Check the engine output above for errors.");
            bail!("patch engine exited with code {exit_code}")
        }
        JobOutcome::Errored { .. } if outcome.cancelled() => {
            println!("{}", "Patch run cancelled.".yellow());
            Ok(())
        }
        JobOutcome::Errored { reason } => bail!("patch run errored: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn configured_settings(dir: &Path) -> Settings {
        fs::write(dir.join("cli.jar"), b"").unwrap();
        fs::write(dir.join("patches.rvp"), b"").unwrap();
        fs::write(dir.join("app.apk"), b"").unwrap();

        let mut settings = Settings::default();
        settings.engine_jar = Some(dir.join("cli.jar"));
        settings.patches_bundle = Some(dir.join("patches.rvp"));
        settings.input_apk = Some(dir.join("app.apk"));
        settings.output_dir = dir.to_path_buf();
        settings
    }

    #[test]
    fn test_build_command_from_configured_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings = configured_settings(dir.path());

        let command = build_command(&settings).unwrap();
        assert_eq!(command.output, dir.path().join("app-revanced.apk"));
        assert!(command.auto_select);
    }

    #[test]
    fn test_build_command_requires_engine() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = configured_settings(dir.path());
        settings.engine_jar = None;

        let err = build_command(&settings).unwrap_err();
        assert!(err.to_string().contains("patch engine jar"));
    }

    #[test]
    fn test_overrides_replace_saved_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = configured_settings(dir.path());
        let args = PatchArgs {
            apk: Some(PathBuf::from("/elsewhere/other.apk")),
            engine: None,
            patches: None,
            output: None,
            java: Some(PathBuf::from("/opt/jdk/bin/java")),
            working_dir: None,
            manual: true,
            log_file: None,
            save: false,
        };

        apply_overrides(&mut settings, &args);
        assert_eq!(settings.input_apk, Some(PathBuf::from("/elsewhere/other.apk")));
        assert_eq!(settings.java, PathBuf::from("/opt/jdk/bin/java"));
        assert!(!settings.use_default_selection);
    }
}
