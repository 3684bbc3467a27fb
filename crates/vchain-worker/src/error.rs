//! Worker error types.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use vchain_client::GatewayError;
use vchain_models::{FailureKind, TaskHandle};

pub type StepResult<T> = Result<T, StepError>;

/// Why a chain step did not complete.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Gateway error: {0}")]
    Gateway(GatewayError),

    #[error("Task {handle} still not finished after {}s", .elapsed.as_secs())]
    PollTimeout { handle: TaskHandle, elapsed: Duration },

    #[error("Task {handle} failed: {message}")]
    TaskFailed { handle: TaskHandle, message: String },

    #[error("Download failed: {0}")]
    Download(String),

    #[error("No frame to continue from: {0}")]
    ExtractionUnavailable(String),

    #[error("Run cancelled")]
    Cancelled,
}

impl StepError {
    /// Classify an error returned when creating a task.
    pub fn from_create(err: GatewayError) -> Self {
        if err.is_invalid_request() {
            Self::InvalidRequest(match err {
                GatewayError::InvalidRequest(msg) => msg,
                other => other.to_string(),
            })
        } else {
            Self::Gateway(err)
        }
    }

    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    /// Failure category reported on the chain result.
    pub fn kind(&self) -> FailureKind {
        match self {
            StepError::InvalidRequest(_) => FailureKind::InvalidRequest,
            StepError::Gateway(_) => FailureKind::Gateway,
            StepError::PollTimeout { .. } => FailureKind::PollTimeout,
            StepError::TaskFailed { .. } => FailureKind::TaskFailed,
            StepError::Download(_) => FailureKind::Download,
            StepError::ExtractionUnavailable(_) => FailureKind::ExtractionUnavailable,
            StepError::Cancelled => FailureKind::Cancelled,
        }
    }

    /// Message for the user, without the category prefix.
    pub fn message(&self) -> String {
        match self {
            StepError::InvalidRequest(msg)
            | StepError::Download(msg)
            | StepError::ExtractionUnavailable(msg) => msg.clone(),
            StepError::Gateway(err) => err.to_string(),
            StepError::TaskFailed { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("No prompts found in {0}")]
    NoPrompts(PathBuf),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn invalid(var: &'static str, value: impl Into<String>, reason: impl ToString) -> Self {
        Self::Invalid {
            var,
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}
