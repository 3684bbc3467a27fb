//! Last-frame extraction.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::command::{FfmpegCommand, MediaTool};
use crate::error::{MediaError, MediaResult};

/// Default wall-clock budget for one extraction.
pub const DEFAULT_FRAME_TIMEOUT: Duration = Duration::from_secs(30);

/// How far before end-of-stream the frame is captured.
const SEEK_FROM_END_SECS: f64 = 0.1;

/// Path of the still image written next to a clip: `<stem>_last_frame.jpg`.
pub fn last_frame_path(media_path: impl AsRef<Path>) -> PathBuf {
    let media_path = media_path.as_ref();
    let stem = media_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "clip".to_string());
    media_path.with_file_name(format!("{}_last_frame.jpg", stem))
}

/// Captures the last frame of a clip as a JPEG using FFmpeg.
#[derive(Clone)]
pub struct LastFrameExtractor {
    tool: Arc<dyn MediaTool>,
    timeout: Duration,
}

impl LastFrameExtractor {
    pub fn new(tool: Arc<dyn MediaTool>) -> Self {
        Self {
            tool,
            timeout: DEFAULT_FRAME_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extract the last frame of `media_path`.
    ///
    /// Succeeds only when FFmpeg exits cleanly and the image exists.
    pub async fn extract(&self, media_path: impl AsRef<Path>) -> MediaResult<PathBuf> {
        let media_path = media_path.as_ref();
        if !media_path.exists() {
            return Err(MediaError::FileNotFound(media_path.to_path_buf()));
        }

        let frame_path = last_frame_path(media_path);
        let cmd = FfmpegCommand::new(media_path, &frame_path)
            .seek_from_end(SEEK_FROM_END_SECS)
            .single_frame()
            .image_quality(2)
            .log_level("error");

        debug!("Extracting last frame of {}", media_path.display());
        self.tool.run(&cmd, self.timeout).await?;

        if !frame_path.exists() {
            return Err(MediaError::OutputMissing(frame_path));
        }

        info!("Extracted last frame: {}", frame_path.display());
        Ok(frame_path)
    }
}
