//! Log buffer
//!
//! Thread-safe capture of the line sequence produced by a job. The event
//! queue carries lines to the live display; the buffer keeps them so the
//! front-end can flush a log file or show the full output after completion.

use std::sync::{Arc, Mutex};

use revx_core::domain::log::LogLine;

/// Sink for captured output lines
pub trait LogBuffer: Send + Sync {
    /// Appends a line to the buffer
    fn append(&self, line: LogLine);

    /// Returns all buffered lines and clears the buffer
    fn drain(&self) -> Vec<LogLine>;

    /// Returns a copy of the buffered lines without draining
    fn snapshot(&self) -> Vec<LogLine>;
}

/// In-memory implementation of [`LogBuffer`]
///
/// Uses `Arc<Mutex<Vec<LogLine>>>` for thread-safe access across tasks.
#[derive(Clone, Default)]
pub struct InMemoryLogBuffer {
    buffer: Arc<Mutex<Vec<LogLine>>>,
}

impl InMemoryLogBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogBuffer for InMemoryLogBuffer {
    fn append(&self, line: LogLine) {
        let mut buffer = self.buffer.lock().unwrap();
        buffer.push(line);
    }

    fn drain(&self) -> Vec<LogLine> {
        let mut buffer = self.buffer.lock().unwrap();
        buffer.drain(..).collect()
    }

    fn snapshot(&self) -> Vec<LogLine> {
        let buffer = self.buffer.lock().unwrap();
        buffer.clone()
    }
}
