//! Log line domain types

use serde::{Deserialize, Serialize};

/// One unit of decoded text emitted by the child process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLine {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub source: StreamSource,
    pub text: String,
}

impl LogLine {
    /// Creates a line stamped with the current time
    pub fn now(source: StreamSource, text: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            source,
            text: text.into(),
        }
    }
}

/// Which child stream a line arrived on
///
/// Lines from both streams land on one ordered queue; the tag is kept for
/// display styling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamSource {
    Stdout,
    Stderr,
}
