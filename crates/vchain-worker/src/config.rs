//! Chain configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use vchain_media::{DEFAULT_CONCAT_TIMEOUT, DEFAULT_FRAME_TIMEOUT};
use vchain_models::{GenerationParams, ImageSource};

use crate::error::{ConfigError, ConfigResult};

/// Polling policy for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between status calls
    pub interval: Duration,
    /// Budget from the first status call
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(600), // 10 minutes
        }
    }
}

/// Chain run configuration.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub poll: PollConfig,
    /// Budget for one last-frame extraction
    pub frame_timeout: Duration,
    /// Budget for the final concatenation
    pub concat_timeout: Duration,
    /// Directory for clips, frames and the joined output
    pub output_dir: PathBuf,
    /// Join the clips after the run
    pub concat_enabled: bool,
    /// Explicit joined output path
    pub concat_output: Option<PathBuf>,
    /// Download retries after the first attempt
    pub download_retries: u32,
    /// First backoff delay between download attempts
    pub download_backoff: Duration,
    /// Generation options shared by every step
    pub params: GenerationParams,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            poll: PollConfig::default(),
            frame_timeout: DEFAULT_FRAME_TIMEOUT,
            concat_timeout: DEFAULT_CONCAT_TIMEOUT,
            output_dir: PathBuf::from("./outputs"),
            concat_enabled: true,
            concat_output: None,
            download_retries: 2,
            download_backoff: Duration::from_secs(1),
            params: GenerationParams::default(),
        }
    }
}

/// Whole seconds; zero is rejected.
fn secs_or(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> ConfigResult<Duration> {
    match parse_var::<u64>(lookup, var)? {
        Some(0) => Err(ConfigError::invalid(var, "0", "must be at least 1 second")),
        Some(secs) => Ok(Duration::from_secs(secs)),
        None => Ok(Duration::from_secs(default)),
    }
}

fn flag_or(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: bool,
) -> ConfigResult<bool> {
    let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(var, value, "expected true or false")),
    }
}

/// Parse a variable strictly; a present but unparsable value is an error.
fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: ToString,
{
    match lookup(var).filter(|v| !v.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::invalid(var, value, e)),
        None => Ok(None),
    }
}

impl ChainConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let defaults = GenerationParams::default();
        let params = GenerationParams {
            model: lookup("CHAIN_MODEL")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.model),
            duration_secs: parse_var(&lookup, "CHAIN_DURATION")?.unwrap_or(defaults.duration_secs),
            ratio: parse_var(&lookup, "CHAIN_RATIO")?.unwrap_or(defaults.ratio),
            resolution: parse_var(&lookup, "CHAIN_RESOLUTION")?.unwrap_or(defaults.resolution),
            generate_audio: flag_or(&lookup, "CHAIN_AUDIO", defaults.generate_audio)?,
            seed: parse_var(&lookup, "CHAIN_SEED")?,
            camera_fixed: flag_or(&lookup, "CHAIN_CAMERA_FIXED", false)?,
            watermark: flag_or(&lookup, "CHAIN_WATERMARK", false)?,
        };
        params
            .validate()
            .map_err(|e| ConfigError::invalid("CHAIN_DURATION", params.duration_secs.to_string(), e))?;

        Ok(Self {
            poll: PollConfig {
                interval: secs_or(&lookup, "CHAIN_POLL_INTERVAL_SECS", 10)?,
                timeout: secs_or(&lookup, "CHAIN_POLL_TIMEOUT_SECS", 600)?,
            },
            frame_timeout: secs_or(&lookup, "CHAIN_FRAME_TIMEOUT_SECS", 30)?,
            concat_timeout: secs_or(&lookup, "CHAIN_CONCAT_TIMEOUT_SECS", 300)?,
            output_dir: lookup("CHAIN_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./outputs")),
            concat_enabled: flag_or(&lookup, "CHAIN_CONCAT", true)?,
            concat_output: lookup("CHAIN_CONCAT_OUTPUT")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            download_retries: parse_var(&lookup, "CHAIN_DOWNLOAD_RETRIES")?.unwrap_or(2),
            download_backoff: Duration::from_secs(1),
            params,
        })
    }
}

/// Inputs of one run of the binary.
#[derive(Debug, Clone)]
pub struct RunInputs {
    /// File with one prompt per line
    pub prompts_file: PathBuf,
    /// First frame of the first step
    pub initial_frame: Option<ImageSource>,
}

impl RunInputs {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let prompts_file = lookup("CHAIN_PROMPTS_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("CHAIN_PROMPTS_FILE"))?;
        let initial_frame = lookup("CHAIN_INITIAL_FRAME")
            .filter(|f| !f.trim().is_empty())
            .map(|f| ImageSource::parse(&f));

        Ok(Self {
            prompts_file,
            initial_frame,
        })
    }
}
