//! Environment checks
//!
//! Verifies the Java runtime answers and the configured artifacts exist,
//! pointing at the upstream release pages for anything missing.

use std::path::Path;

use anyhow::Result;
use colored::*;
use revx_core::settings::Settings;
use tokio::process::Command;

/// Release page for obtaining the patch engine
const ENGINE_DOWNLOAD_URL: &str = "https://github.com/ReVanced/revanced-cli/releases";

/// Release page for obtaining patch bundles
const PATCHES_DOWNLOAD_URL: &str = "https://github.com/ReVanced/revanced-patches/releases";

pub async fn handle_doctor(settings_path: &Path) -> Result<()> {
    let settings = Settings::load(settings_path)?;

    match java_version(&settings.java).await {
        Some(version) => println!("{} Java runtime: {}", "✓".green(), version),
        None => {
            println!(
                "{} Java runtime '{}' did not answer -version",
                "✗".red(),
                settings.java.display()
            );
            println!("  Install a Java runtime or point `revx config set --java` at one.");
        }
    }

    check_file("Patch engine", settings.engine_jar.as_deref(), ENGINE_DOWNLOAD_URL);
    check_file(
        "Patch bundle",
        settings.patches_bundle.as_deref(),
        PATCHES_DOWNLOAD_URL,
    );

    if settings.output_dir.is_dir() {
        println!(
            "{} Output directory: {}",
            "✓".green(),
            settings.output_dir.display()
        );
    } else {
        println!(
            "{} Output directory missing: {}",
            "✗".red(),
            settings.output_dir.display()
        );
    }

    Ok(())
}

/// Probes `<java> -version` and returns the first banner line.
///
/// Java prints its version banner on stderr.
async fn java_version(java: &Path) -> Option<String> {
    let output = Command::new(java).arg("-version").output().await.ok()?;
    if !output.status.success() {
        return None;
    }

    let banner = if output.stderr.is_empty() {
        &output.stdout
    } else {
        &output.stderr
    };
    String::from_utf8_lossy(banner)
        .lines()
        .next()
        .map(|s| s.trim().to_string())
}

fn check_file(label: &str, path: Option<&Path>, download_url: &str) {
    match path {
        Some(path) if path.is_file() => {
            println!("{} {}: {}", "✓".green(), label, path.display());
        }
        Some(path) => {
            println!("{} {} missing: {}", "✗".red(), label, path.display());
            println!("  Download: {}", download_url.dimmed());
        }
        None => {
            println!("{} {} not configured", "✗".red(), label);
            println!("  Download: {}", download_url.dimmed());
        }
    }
}
