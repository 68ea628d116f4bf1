//! Error types shared by the runner and the front-end

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Errors a start request can fail with.
///
/// A non-zero engine exit is not an error here: it is surfaced as the
/// `Failed(code)` terminal state together with the full captured output.
/// Likewise cancellation is user-initiated and ends the job in
/// `Errored("cancelled")` without raising anything.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// A job is active; new runs are rejected, not queued
    #[error("a patch job is already running")]
    AlreadyRunning,

    /// The configured executable does not exist or is not on the PATH
    #[error("executable not found: {program}")]
    ExecutableNotFound { program: String },

    /// The executable exists but the process could not be started
    #[error("failed to launch {program}: {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunnerError {
    pub fn is_already_running(&self) -> bool {
        matches!(self, Self::AlreadyRunning)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ExecutableNotFound { .. })
    }
}

/// Errors from loading, saving, or validating the persisted settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A required input was never configured
    #[error("{field} is not configured")]
    NotConfigured { field: &'static str },

    /// The patch engine jar path does not name a file
    #[error("patch engine jar not found: {0}")]
    EngineMissing(PathBuf),

    /// The patch bundle path does not name a file
    #[error("patch bundle not found: {0}")]
    PatchesMissing(PathBuf),

    /// The input package path does not name a file
    #[error("application package not found: {0}")]
    PackageMissing(PathBuf),

    /// The output directory does not exist
    #[error("output directory not found: {0}")]
    OutputDirMissing(PathBuf),

    /// Settings file could not be read or written
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid JSON
    #[error("settings file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_predicates() {
        assert!(RunnerError::AlreadyRunning.is_already_running());
        assert!(
            RunnerError::ExecutableNotFound {
                program: "java".to_string()
            }
            .is_not_found()
        );
        assert!(!RunnerError::AlreadyRunning.is_not_found());
    }
}
