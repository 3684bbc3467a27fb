//! Prompt list loading.

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// One prompt per line; lines are trimmed and blank lines skipped.
pub fn parse_prompts(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Read a prompt file. A file without prompts is an error.
pub async fn load_prompts(path: impl AsRef<Path>) -> ConfigResult<Vec<String>> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let prompts = parse_prompts(&contents);
    if prompts.is_empty() {
        return Err(ConfigError::NoPrompts(path.to_path_buf()));
    }
    Ok(prompts)
}
