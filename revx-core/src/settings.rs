//! Persisted user settings
//!
//! The front-end collects a handful of file-system paths and one boolean and
//! keeps them in a flat JSON file between runs. The settings object is
//! explicit: it is loaded once, passed to whatever needs it, and written back
//! only through [`Settings::save`]; there is no ambient shared state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// User settings persisted between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Patch engine jar (revanced-cli style)
    pub engine_jar: Option<PathBuf>,
    /// Patch bundle file (.rvp / .jar)
    pub patches_bundle: Option<PathBuf>,
    /// Last application package selected for patching
    pub input_apk: Option<PathBuf>,
    /// Directory the patched artifact is written to
    pub output_dir: PathBuf,
    /// Apply the engine's default patch selection instead of manual picking
    pub use_default_selection: bool,
    /// Java runtime used to launch the engine
    pub java: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine_jar: None,
            patches_bundle: None,
            input_apk: None,
            output_dir: home_dir(),
            use_default_selection: true,
            java: PathBuf::from("java"),
        }
    }
}

impl Settings {
    /// Loads settings from `path`.
    ///
    /// A missing file is not an error: defaults are returned so a first run
    /// works without any prior configuration. A present-but-malformed file is
    /// surfaced instead of silently discarded.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes settings to `path` as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Validates that every configured path still names what it should.
    ///
    /// Presence of the individual fields is checked at run assembly, not
    /// here: a half-configured settings file is fine until a patch run
    /// actually needs the missing piece.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(path) = &self.engine_jar {
            if !path.is_file() {
                return Err(SettingsError::EngineMissing(path.clone()));
            }
        }
        if let Some(path) = &self.patches_bundle {
            if !path.is_file() {
                return Err(SettingsError::PatchesMissing(path.clone()));
            }
        }
        if let Some(path) = &self.input_apk {
            if !path.is_file() {
                return Err(SettingsError::PackageMissing(path.clone()));
            }
        }
        if !self.output_dir.is_dir() {
            return Err(SettingsError::OutputDirMissing(self.output_dir.clone()));
        }
        Ok(())
    }
}

/// Default location of the settings file: `$REVX_SETTINGS` if set, otherwise
/// `~/.config/revx/settings.json`.
pub fn default_path() -> PathBuf {
    if let Some(path) = std::env::var_os("REVX_SETTINGS") {
        return PathBuf::from(path);
    }
    home_dir().join(".config").join("revx").join("settings.json")
}

/// The user's home directory, falling back to the current directory
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}
