//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while running FFmpeg.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("FFmpeg reported success but produced no output at {0}")]
    OutputMissing(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Diagnostic text for the user: FFmpeg's stderr when captured, else the message.
    pub fn diagnostic(&self) -> String {
        match self {
            MediaError::FfmpegFailed {
                stderr: Some(stderr),
                ..
            } if !stderr.trim().is_empty() => stderr.trim().to_string(),
            other => other.to_string(),
        }
    }
}

/// Errors from the concatenation step.
#[derive(Debug, Error)]
pub enum ConcatError {
    #[error("No clips to concatenate")]
    NoInputs,

    #[error("FFmpeg not found in PATH; clips were left in place")]
    ToolMissing,

    #[error("FFmpeg concat failed: {0}")]
    ToolError(String),

    #[error("Concatenation output {0} would overwrite one of its inputs")]
    OutputConflict(PathBuf),
}

impl From<MediaError> for ConcatError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::FfmpegNotFound => ConcatError::ToolMissing,
            other => ConcatError::ToolError(other.diagnostic()),
        }
    }
}
