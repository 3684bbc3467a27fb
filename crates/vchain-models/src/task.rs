//! Remote task handles and statuses.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one remote generation task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TaskHandle(pub String);

impl TaskHandle {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outputs declared by a succeeded task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaskOutput {
    /// Primary media (the generated clip)
    pub video_url: String,
    /// Last frame of the clip, when the service returns it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_frame_url: Option<String>,
}

/// Status of a remote generation task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for capacity on the service
    Queued,
    /// Generation in progress
    Running,
    /// Generation finished
    Succeeded(TaskOutput),
    /// Generation failed on the service
    Failed { message: String },
    /// Status string this client does not know; treated as non-terminal
    Unknown { raw: String },
}

impl TaskStatus {
    /// Short label used in logs and events.
    pub fn label(&self) -> &str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded(_) => "succeeded",
            TaskStatus::Failed { .. } => "failed",
            TaskStatus::Unknown { .. } => "unknown",
        }
    }

    /// Check if this is a terminal state (no more transitions expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Succeeded(_) | TaskStatus::Failed { .. })
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Unknown { raw } => write!(f, "unknown ({})", raw),
            other => f.write_str(other.label()),
        }
    }
}
