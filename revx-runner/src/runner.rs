//! Patch job runner
//!
//! Owns the single current-job slot. `start` spawns the engine process with
//! both output streams piped, relays decoded lines onto an ordered event
//! queue from dedicated reader tasks, and reports the terminal state when
//! the process exits. The caller never blocks on child I/O; it only drains
//! the event receiver.
//!
//! Invariant: at most one job is running at a time. A start request while
//! the slot is occupied is rejected, never queued.

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use revx_core::command::Invocation;
use revx_core::domain::job::{
    Job, JobEvent, JobOutcome, JobState, REASON_CANCELLED, REASON_EXECUTABLE_NOT_FOUND,
};
use revx_core::domain::log::{LogLine, StreamSource};
use revx_core::error::{Result, RunnerError};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RunnerConfig;
use crate::log_buffer::{InMemoryLogBuffer, LogBuffer};

/// Handle to a started job
///
/// `events` yields the run's [`JobEvent`]s in order; `Finished` is always
/// the last one.
#[derive(Debug)]
pub struct JobHandle {
    pub job_id: Uuid,
    pub events: mpsc::UnboundedReceiver<JobEvent>,
}

/// The occupied current-job slot
struct ActiveJob {
    job_id: Uuid,
    cancel: watch::Sender<bool>,
}

/// State shared between the runner facade and the supervising task
struct Shared {
    buffer: Arc<dyn LogBuffer>,
    state: Mutex<JobState>,
    current: Mutex<Option<ActiveJob>>,
}

impl Shared {
    fn set_state(&self, next: JobState) {
        let mut state = self.state.lock().unwrap();
        debug!("job state transition: {:?} -> {:?}", *state, next);
        *state = next;
    }
}

/// Launches patch jobs and publishes their lifecycle
pub struct JobRunner {
    config: RunnerConfig,
    shared: Arc<Shared>,
}

impl JobRunner {
    /// Creates a runner with a private in-memory log buffer
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_buffer(config, Arc::new(InMemoryLogBuffer::new()))
    }

    /// Creates a runner writing captured lines into the given buffer
    pub fn with_buffer(config: RunnerConfig, buffer: Arc<dyn LogBuffer>) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                buffer,
                state: Mutex::new(JobState::Idle),
                current: Mutex::new(None),
            }),
        }
    }

    /// Snapshot of the current job state
    pub fn state(&self) -> JobState {
        self.shared.state.lock().unwrap().clone()
    }

    /// Starts a job for the given invocation.
    ///
    /// Rejects with [`RunnerError::AlreadyRunning`] while a job is active,
    /// leaving that job untouched. A spawn failure transitions directly to
    /// `Errored` without the job ever reporting `Running`.
    pub fn start(&self, invocation: Invocation) -> Result<JobHandle> {
        let mut current = self.shared.current.lock().unwrap();
        if current.is_some() {
            return Err(RunnerError::AlreadyRunning);
        }

        let job = Job::new(invocation);
        let program = job.invocation.program.to_string_lossy().into_owned();

        let mut command = Command::new(&job.invocation.program);
        command
            .args(&job.invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &job.invocation.working_dir {
            command.current_dir(dir);
        }

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.shared
                    .set_state(JobState::Errored(REASON_EXECUTABLE_NOT_FOUND.to_string()));
                return Err(RunnerError::ExecutableNotFound { program });
            }
            Err(e) => {
                self.shared
                    .set_state(JobState::Errored(format!("launch failed: {e}")));
                return Err(RunnerError::LaunchFailed { program, source: e });
            }
        };

        self.shared.set_state(JobState::Running);
        info!("job {} running: {}", job.id, job.invocation.display_line());

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let job_id = job.id;
        *current = Some(ActiveJob {
            job_id,
            cancel: cancel_tx,
        });
        drop(current);

        let _ = event_tx.send(JobEvent::Started {
            job_id,
            command_line: job.invocation.display_line(),
        });

        let shared = Arc::clone(&self.shared);
        let grace = self.config.kill_grace;
        tokio::spawn(async move {
            Self::supervise(shared, job, child, event_tx, cancel_rx, grace).await;
        });

        Ok(JobHandle {
            job_id,
            events: event_rx,
        })
    }

    /// Requests best-effort termination of the active job.
    ///
    /// A no-op when no job is running. The job ends in `Errored("cancelled")`
    /// once the supervising task has reaped (or given up on) the process.
    pub fn cancel(&self) {
        let current = self.shared.current.lock().unwrap();
        match current.as_ref() {
            Some(active) => {
                info!("cancelling job {}", active.job_id);
                let _ = active.cancel.send(true);
            }
            None => debug!("cancel requested with no active job"),
        }
    }

    /// Waits for the process to end, drains the readers, and publishes the
    /// terminal state followed by the final event.
    async fn supervise(
        shared: Arc<Shared>,
        job: Job,
        mut child: Child,
        event_tx: mpsc::UnboundedSender<JobEvent>,
        mut cancel_rx: watch::Receiver<bool>,
        grace: Duration,
    ) {
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(Self::spawn_line_reader(
                stdout,
                StreamSource::Stdout,
                Arc::clone(&shared),
                event_tx.clone(),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(Self::spawn_line_reader(
                stderr,
                StreamSource::Stderr,
                Arc::clone(&shared),
                event_tx.clone(),
            ));
        }

        let exit = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancel_rx.changed() => None,
        };

        let outcome = match exit {
            Some(Ok(status)) => Self::outcome_for_exit(status, &job),
            Some(Err(e)) => JobOutcome::Errored {
                reason: format!("failed to await process: {e}"),
            },
            None => {
                info!("job {} cancel requested, killing process", job.id);
                if let Err(e) = child.start_kill() {
                    warn!("failed to kill job {}: {}", job.id, e);
                }
                // Advisory termination: never hang on a process that will
                // not die, bound the reap and move on.
                match timeout(grace, child.wait()).await {
                    Ok(Ok(status)) => debug!("job {} reaped after cancel: {}", job.id, status),
                    Ok(Err(e)) => warn!("failed to reap cancelled job {}: {}", job.id, e),
                    Err(_) => warn!(
                        "job {} did not exit within {:?} after kill",
                        job.id, grace
                    ),
                }
                JobOutcome::Errored {
                    reason: REASON_CANCELLED.to_string(),
                }
            }
        };

        // Drain the readers to EOF so every line the process emitted is
        // published before the final event. Grandchildren can keep the pipes
        // open past the kill, so the drain is bounded too.
        for mut reader in readers {
            if timeout(grace, &mut reader).await.is_err() {
                reader.abort();
            }
        }

        shared.set_state(outcome.state());
        *shared.current.lock().unwrap() = None;
        let _ = event_tx.send(JobEvent::Finished {
            job_id: job.id,
            outcome,
        });
    }

    /// Reads one child stream line by line, appending to the buffer and the
    /// event queue in emission order
    fn spawn_line_reader<R>(
        stream: R,
        source: StreamSource,
        shared: Arc<Shared>,
        event_tx: mpsc::UnboundedSender<JobEvent>,
    ) -> tokio::task::JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(text)) => {
                        let line = LogLine::now(source, text);
                        shared.buffer.append(line.clone());
                        if event_tx.send(JobEvent::Line(line)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        debug!("stopped reading {:?} stream: {}", source, e);
                        break;
                    }
                }
            }
        })
    }

    fn outcome_for_exit(status: std::process::ExitStatus, job: &Job) -> JobOutcome {
        match status.code() {
            Some(0) => JobOutcome::Succeeded {
                output: job.invocation.output.clone(),
            },
            Some(code) => JobOutcome::Failed { exit_code: code },
            // Killed by a signal outside the runner's own cancellation path
            None => JobOutcome::Failed { exit_code: -1 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn sh(script: &str) -> Invocation {
        Invocation::new("/bin/sh").arg("-c").arg(script)
    }

    /// Drains a handle's queue, returning the line texts and the outcome
    async fn collect(handle: &mut JobHandle) -> (Vec<String>, Option<JobOutcome>) {
        let mut lines = Vec::new();
        let mut outcome = None;
        while let Some(event) = handle.events.recv().await {
            match event {
                JobEvent::Started { .. } => {}
                JobEvent::Line(line) => lines.push(line.text),
                JobEvent::Finished { outcome: o, .. } => {
                    outcome = Some(o);
                    break;
                }
            }
        }
        (lines, outcome)
    }

    #[test]
    fn test_cancel_on_idle_is_a_noop() {
        let runner = JobRunner::new(RunnerConfig::default());
        runner.cancel();
        assert_eq!(runner.state(), JobState::Idle);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_lines_arrive_in_order_then_succeeded() {
        let runner = JobRunner::new(RunnerConfig::default());
        let mut handle = runner
            .start(sh("printf 'one\\ntwo\\nthree\\n'"))
            .unwrap();

        let (lines, outcome) = collect(&mut handle).await;
        assert_eq!(lines, vec!["one", "two", "three"]);
        assert!(matches!(outcome, Some(JobOutcome::Succeeded { .. })));
        assert_eq!(runner.state(), JobState::Succeeded);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_maps_to_failed() {
        let runner = JobRunner::new(RunnerConfig::default());
        let mut handle = runner.start(sh("echo doomed; exit 3")).unwrap();

        let (lines, outcome) = collect(&mut handle).await;
        assert_eq!(lines, vec!["doomed"]);
        assert_eq!(outcome, Some(JobOutcome::Failed { exit_code: 3 }));
        assert_eq!(runner.state(), JobState::Failed(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_executable_errors_without_running() {
        let runner = JobRunner::new(RunnerConfig::default());
        let err = runner
            .start(Invocation::new("/definitely/not/a/java"))
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(
            runner.state(),
            JobState::Errored(REASON_EXECUTABLE_NOT_FOUND.to_string())
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let runner = JobRunner::new(RunnerConfig::default());
        let mut handle = runner.start(sh("sleep 1; echo done")).unwrap();

        let err = runner.start(sh("echo nope")).unwrap_err();
        assert!(err.is_already_running());
        assert_eq!(runner.state(), JobState::Running);

        // The first job is untouched by the rejected request.
        let (lines, outcome) = collect(&mut handle).await;
        assert_eq!(lines, vec!["done"]);
        assert!(matches!(outcome, Some(JobOutcome::Succeeded { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_ends_in_cancelled_state_and_frees_the_slot() {
        let runner = JobRunner::new(RunnerConfig::default());
        let mut handle = runner.start(sh("sleep 30")).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        runner.cancel();

        let (_, outcome) = collect(&mut handle).await;
        assert_eq!(
            outcome,
            Some(JobOutcome::Errored {
                reason: REASON_CANCELLED.to_string()
            })
        );
        assert_eq!(
            runner.state(),
            JobState::Errored(REASON_CANCELLED.to_string())
        );

        // The slot is free again.
        let mut handle = runner.start(sh("true")).unwrap();
        let (_, outcome) = collect(&mut handle).await;
        assert!(matches!(outcome, Some(JobOutcome::Succeeded { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stderr_lines_are_relayed_and_tagged() {
        let runner = JobRunner::new(RunnerConfig::default());
        let mut handle = runner.start(sh("echo err 1>&2")).unwrap();

        let mut tagged = Vec::new();
        while let Some(event) = handle.events.recv().await {
            match event {
                JobEvent::Line(line) => tagged.push((line.source, line.text)),
                JobEvent::Finished { .. } => break,
                JobEvent::Started { .. } => {}
            }
        }
        assert_eq!(tagged, vec![(StreamSource::Stderr, "err".to_string())]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_buffer_captures_lines_for_later_flush() {
        let buffer = Arc::new(InMemoryLogBuffer::new());
        let runner = JobRunner::with_buffer(RunnerConfig::default(), buffer.clone());
        let mut handle = runner.start(sh("printf 'a\\nb\\n'")).unwrap();

        let (_, outcome) = collect(&mut handle).await;
        assert!(matches!(outcome, Some(JobOutcome::Succeeded { .. })));

        let captured = buffer.snapshot();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].text, "a");
        assert_eq!(captured[1].text, "b");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_reports_output_artifact() {
        let runner = JobRunner::new(RunnerConfig::default());
        let invocation = sh("true").output("/tmp/app-revanced.apk");
        let mut handle = runner.start(invocation).unwrap();

        let (_, outcome) = collect(&mut handle).await;
        assert_eq!(
            outcome,
            Some(JobOutcome::Succeeded {
                output: Some("/tmp/app-revanced.apk".into())
            })
        );
    }
}
