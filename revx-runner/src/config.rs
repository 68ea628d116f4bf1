//! Runner configuration
//!
//! Cancellation is advisory: the child process is killed, but the runner
//! never waits on it unbounded. The grace period bounds both the post-kill
//! wait and the drain of the output readers.

use std::time::Duration;

const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(5);

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Maximum time to wait for the child process (and its output readers)
    /// after a kill before the runner gives up and reports the terminal state
    pub kill_grace: Duration,
}

impl RunnerConfig {
    /// Creates configuration from environment variables, falling back to
    /// defaults.
    ///
    /// Recognized variables:
    /// - REVX_KILL_GRACE (optional, seconds, default: 5)
    pub fn from_env() -> Self {
        let kill_grace = std::env::var("REVX_KILL_GRACE")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_KILL_GRACE);

        Self { kill_grace }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.kill_grace.is_zero() {
            anyhow::bail!("kill_grace must be greater than 0");
        }
        Ok(())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }
}
