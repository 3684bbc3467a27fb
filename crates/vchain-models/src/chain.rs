//! Chain steps, failures and run results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::{ImageSource, TaskHandle};

/// Still image of a clip's last frame, handed to the next step as its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "source", content = "location", rename_all = "snake_case")]
pub enum ContinuationArtifact {
    /// Returned by the service
    RemoteUrl(String),
    /// Extracted locally from the downloaded clip
    LocalFrame(PathBuf),
}

impl ContinuationArtifact {
    /// Convert into the input image of the next request.
    pub fn to_image_source(&self) -> ImageSource {
        match self {
            ContinuationArtifact::RemoteUrl(url) => ImageSource::Url(url.clone()),
            ContinuationArtifact::LocalFrame(path) => ImageSource::LocalPath(path.clone()),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ContinuationArtifact::RemoteUrl(_))
    }
}

impl fmt::Display for ContinuationArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContinuationArtifact::RemoteUrl(url) => write!(f, "{}", url),
            ContinuationArtifact::LocalFrame(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A successfully completed chain step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChainStep {
    /// Zero-based position in the chain
    pub index: usize,
    pub prompt: String,
    /// First frame used for this step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<ImageSource>,
    pub task_id: TaskHandle,
    /// Downloaded clip
    pub media_path: PathBuf,
    /// Frame available to the next step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation: Option<ContinuationArtifact>,
}

/// Failure category of a chain step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Request rejected before or by the service (not retried)
    InvalidRequest,
    /// Transport-level failure talking to the service
    Gateway,
    /// Task still running when the poll deadline passed
    PollTimeout,
    /// Service reported the task as failed
    TaskFailed,
    /// Clip could not be downloaded
    Download,
    /// Previous step produced no frame to continue from
    ExtractionUnavailable,
    /// Run aborted between steps
    Cancelled,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidRequest => "invalid_request",
            FailureKind::Gateway => "gateway_error",
            FailureKind::PollTimeout => "poll_timeout",
            FailureKind::TaskFailed => "task_failed",
            FailureKind::Download => "download_failed",
            FailureKind::ExtractionUnavailable => "extraction_unavailable",
            FailureKind::Cancelled => "cancelled",
        }
    }

    /// Whether the step never reached the service because of the chain itself.
    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            FailureKind::ExtractionUnavailable | FailureKind::Cancelled
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The step that stopped the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChainFailure {
    /// Zero-based index of the failed (or blocked) step
    pub index: usize,
    pub prompt: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of one chain run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChainResult {
    /// Number of prompts requested
    pub total_steps: usize,
    /// Completed steps, in order
    pub completed: Vec<ChainStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ChainFailure>,
    /// Concatenated output, when assembly ran and succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concatenated: Option<PathBuf>,
    /// Concatenation error, when assembly ran and failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concat_error: Option<String>,
}

impl ChainResult {
    /// Create an empty result for a run of `total_steps` prompts.
    pub fn new(total_steps: usize) -> Self {
        Self {
            total_steps,
            ..Default::default()
        }
    }

    /// Index of the first failed step, if any.
    pub fn failed_index(&self) -> Option<usize> {
        self.failure.as_ref().map(|f| f.index)
    }

    /// Every requested step completed.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.completed.len() == self.total_steps
    }

    /// Downloaded clips in chain order.
    pub fn media_paths(&self) -> Vec<PathBuf> {
        self.completed.iter().map(|s| s.media_path.clone()).collect()
    }

    /// The single artifact that represents the whole run.
    ///
    /// The concatenated file when present, otherwise the only clip of a
    /// one-step chain.
    pub fn final_output(&self) -> Option<&PathBuf> {
        self.concatenated.as_ref().or_else(|| match self.completed.as_slice() {
            [only] => Some(&only.media_path),
            _ => None,
        })
    }
}

impl fmt::Display for ChainResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Generated {}/{} clips",
            self.completed.len(),
            self.total_steps
        )?;

        for index in 0..self.total_steps {
            let n = index + 1;
            if let Some(step) = self.completed.get(index) {
                writeln!(f, "  [{}] ok       {}", n, step.media_path.display())?;
            } else if let Some(failure) = self.failure.as_ref().filter(|fl| fl.index == index) {
                let label = if failure.kind.is_blocked() {
                    "blocked"
                } else {
                    "failed "
                };
                writeln!(f, "  [{}] {}  {}: {}", n, label, failure.kind, failure.message)?;
            } else {
                writeln!(f, "  [{}] skipped", n)?;
            }
        }

        if let Some(path) = &self.concatenated {
            writeln!(f, "Concatenated: {}", path.display())?;
        } else if let Some(err) = &self.concat_error {
            writeln!(f, "Concatenation failed: {}", err)?;
        }
        Ok(())
    }
}
