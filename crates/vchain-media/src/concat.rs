//! Lossless concatenation of clips with FFmpeg's concat demuxer.
//!
//! Clips produced by one chain share codec parameters, so they are joined at
//! the container level with stream copy. Nothing is re-encoded.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs;
use tracing::{info, warn};

use crate::command::{FfmpegCommand, MediaTool};
use crate::error::ConcatError;

/// Default wall-clock budget for one concatenation.
pub const DEFAULT_CONCAT_TIMEOUT: Duration = Duration::from_secs(300);

/// Quote a path for a concat manifest line.
///
/// Single quotes close the quoted string, emit an escaped quote and reopen it.
pub fn escape_manifest_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    format!("'{}'", raw.replace('\'', "'\\''"))
}

/// Ordered list of clips in FFmpeg concat-demuxer syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatManifest {
    entries: Vec<PathBuf>,
}

impl ConcatManifest {
    pub fn new(entries: Vec<PathBuf>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Manifest file contents, one `file '<path>'` line per clip.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|p| format!("file {}\n", escape_manifest_path(p)))
            .collect()
    }

    /// Parse manifest contents back into paths.
    pub fn parse(contents: &str) -> Self {
        let entries = contents
            .lines()
            .filter_map(|line| line.trim().strip_prefix("file "))
            .map(|quoted| {
                let inner = quoted
                    .strip_prefix('\'')
                    .and_then(|s| s.strip_suffix('\''))
                    .unwrap_or(quoted);
                PathBuf::from(inner.replace("'\\''", "'"))
            })
            .collect();
        Self { entries }
    }
}

/// Joins completed clips into one continuous file.
#[derive(Clone)]
pub struct Concatenator {
    tool: Arc<dyn MediaTool>,
    timeout: Duration,
}

impl Concatenator {
    pub fn new(tool: Arc<dyn MediaTool>) -> Self {
        Self {
            tool,
            timeout: DEFAULT_CONCAT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path of the manifest written for `output`.
    pub fn manifest_path(output: &Path) -> PathBuf {
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        output.with_file_name(format!("{}_concat_list.txt", stem))
    }

    /// Concatenate `inputs` in order into `output`.
    ///
    /// The manifest is removed afterwards whether or not FFmpeg succeeded.
    /// Input clips are never modified.
    pub async fn concatenate(
        &self,
        inputs: &[PathBuf],
        output: impl AsRef<Path>,
    ) -> Result<PathBuf, ConcatError> {
        let output = output.as_ref();

        if inputs.is_empty() {
            return Err(ConcatError::NoInputs);
        }

        let mut entries = Vec::with_capacity(inputs.len());
        for input in inputs {
            if input == output {
                return Err(ConcatError::OutputConflict(output.to_path_buf()));
            }
            // Absolute paths: the demuxer resolves relative entries against the manifest
            let absolute = fs::canonicalize(input).await.map_err(|e| {
                ConcatError::ToolError(format!("cannot read clip {}: {}", input.display(), e))
            })?;
            entries.push(absolute);
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConcatError::ToolError(format!("cannot create {}: {}", parent.display(), e)))?;
        }
        if let Ok(existing) = fs::canonicalize(output).await {
            if entries.contains(&existing) {
                return Err(ConcatError::OutputConflict(output.to_path_buf()));
            }
        }

        let manifest = ConcatManifest::new(entries);
        let manifest_path = Self::manifest_path(output);
        fs::write(&manifest_path, manifest.render())
            .await
            .map_err(|e| ConcatError::ToolError(format!("cannot write manifest: {}", e)))?;

        let cmd = FfmpegCommand::new(&manifest_path, output)
            .input_format("concat")
            .input_arg("-safe")
            .input_arg("0")
            .codec_copy()
            .log_level("error");

        info!(
            "Concatenating {} clips into {}",
            manifest.entries().len(),
            output.display()
        );
        let result = self.tool.run(&cmd, self.timeout).await;

        if let Err(e) = fs::remove_file(&manifest_path).await {
            warn!(
                "Failed to remove concat manifest {}: {}",
                manifest_path.display(),
                e
            );
        }

        result?;
        info!("Concatenation complete: {}", output.display());
        Ok(output.to_path_buf())
    }
}
