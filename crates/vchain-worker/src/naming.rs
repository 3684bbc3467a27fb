//! Output file naming.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Characters of the prompt considered for a file name.
const PROMPT_PREFIX_CHARS: usize = 20;

/// Reduce a prompt to a file-name-safe fragment.
///
/// Takes the first 20 characters, turns spaces into underscores and keeps
/// only ASCII alphanumerics, `_` and `-`. Falls back to `video`.
pub fn sanitize_filename(text: &str) -> String {
    let sanitized: String = text
        .chars()
        .take(PROMPT_PREFIX_CHARS)
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    if sanitized.is_empty() {
        "video".to_string()
    } else {
        sanitized
    }
}

/// `YYYYmmdd_HHMMSS` in local time.
pub fn timestamp(at: DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// `<dir>/<NN>_<prompt>_<ts>.mp4` for the zero-based step `index`.
pub fn clip_path(dir: &Path, index: usize, prompt: &str, at: DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "{:02}_{}_{}.mp4",
        index + 1,
        sanitize_filename(prompt),
        timestamp(at)
    ))
}

/// `<dir>/continuous_video_<ts>.mp4`.
pub fn concat_path(dir: &Path, at: DateTime<Local>) -> PathBuf {
    dir.join(format!("continuous_video_{}.mp4", timestamp(at)))
}
