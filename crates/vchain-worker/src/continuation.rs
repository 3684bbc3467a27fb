//! Continuation frame resolution.

use std::path::Path;

use tracing::{debug, warn};
use vchain_media::{LastFrameExtractor, MediaResult};
use vchain_models::{ContinuationArtifact, TaskOutput};

/// Finds the frame the next step starts from.
///
/// The service's own last-frame URL wins. Without one, the last frame is
/// extracted from the downloaded clip with FFmpeg.
#[derive(Clone)]
pub struct ContinuationExtractor {
    frames: LastFrameExtractor,
}

impl ContinuationExtractor {
    pub fn new(frames: LastFrameExtractor) -> Self {
        Self { frames }
    }

    /// Resolve the continuation artifact, reporting why it is unavailable.
    pub async fn resolve(
        &self,
        output: &TaskOutput,
        media_path: &Path,
    ) -> MediaResult<ContinuationArtifact> {
        if let Some(url) = output.last_frame_url.as_ref().filter(|u| !u.is_empty()) {
            debug!("Using service-provided last frame");
            return Ok(ContinuationArtifact::RemoteUrl(url.clone()));
        }

        debug!(
            "No last frame from the service, extracting from {}",
            media_path.display()
        );
        let frame = self.frames.extract(media_path).await?;
        Ok(ContinuationArtifact::LocalFrame(frame))
    }

    /// Resolve the continuation artifact; `None` when none can be produced.
    pub async fn extract(
        &self,
        output: &TaskOutput,
        media_path: &Path,
    ) -> Option<ContinuationArtifact> {
        match self.resolve(output, media_path).await {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!(
                    "Last frame unavailable for {}: {}",
                    media_path.display(),
                    e.diagnostic()
                );
                None
            }
        }
    }
}
