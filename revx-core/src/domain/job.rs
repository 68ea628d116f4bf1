//! Job domain types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::command::Invocation;
use crate::domain::log::LogLine;

/// Terminal-state reason used when the engine executable could not be launched.
pub const REASON_EXECUTABLE_NOT_FOUND: &str = "executable not found";

/// Terminal-state reason used after a user-initiated cancellation.
pub const REASON_CANCELLED: &str = "cancelled";

/// One external-tool invocation and its observable lifecycle.
///
/// Created by the runner when a run is triggered. A job lives until the
/// process exits or the run is cancelled; it is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub invocation: Invocation,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl Job {
    /// Creates a new job for the given invocation, stamped with the current time
    pub fn new(invocation: Invocation) -> Self {
        Self {
            id: Uuid::new_v4(),
            invocation,
            started_at: chrono::Utc::now(),
        }
    }
}

/// Job lifecycle state
///
/// A simple state machine: `Idle` → `Running` → one of the terminal states.
/// There is no queueing; a start request while a job is running is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Idle,
    Running,
    Succeeded,
    Failed(i32),
    Errored(String),
}

impl JobState {
    /// Whether this state ends a job's lifecycle
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Idle | Self::Running)
    }
}

/// Terminal result of a job
///
/// Carried by the completion event so the front-end can report without
/// re-reading runner state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobOutcome {
    /// Process exited with code zero; `output` is the artifact path the
    /// engine was asked to write
    Succeeded { output: Option<PathBuf> },
    /// Process exited with a non-zero code, surfaced verbatim
    Failed { exit_code: i32 },
    /// The run never completed normally (launch failure or cancellation)
    Errored { reason: String },
}

impl JobOutcome {
    pub fn success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// The job state this outcome transitions to
    pub fn state(&self) -> JobState {
        match self {
            Self::Succeeded { .. } => JobState::Succeeded,
            Self::Failed { exit_code } => JobState::Failed(*exit_code),
            Self::Errored { reason } => JobState::Errored(reason.clone()),
        }
    }

    pub fn cancelled(&self) -> bool {
        matches!(self, Self::Errored { reason } if reason == REASON_CANCELLED)
    }
}

/// Event published by the runner on the front-end update queue
///
/// Replaces direct widget mutation: the runner never touches the display,
/// it only appends to this ordered sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobEvent {
    /// The child process was spawned; `command_line` is the shell-quoted
    /// invocation for echoing
    Started { job_id: Uuid, command_line: String },
    /// One decoded line of child output, in emission order
    Line(LogLine),
    /// The job reached a terminal state; always the last event of a run
    Finished { job_id: Uuid, outcome: JobOutcome },
}
