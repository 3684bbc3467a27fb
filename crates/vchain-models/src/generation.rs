//! Generation request and option-set definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default model (highest quality, audio/video sync).
pub const DEFAULT_MODEL: &str = "doubao-seedance-1-5-pro-251215";
/// Lightweight image-to-video model. Does not support audio.
pub const LITE_I2V_MODEL: &str = "doubao-seedance-1-0-lite-i2v-250428";

/// Clip duration bounds in seconds (inclusive).
pub const MIN_DURATION_SECS: u32 = 4;
pub const MAX_DURATION_SECS: u32 = 12;
pub const DEFAULT_DURATION_SECS: u32 = 5;

/// Image extensions accepted for local input frames.
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "21:9")]
    Ultrawide21x9,
    /// Let the service follow the input image
    #[default]
    #[serde(rename = "adaptive")]
    Adaptive,
}

impl AspectRatio {
    pub const ALL: &'static [AspectRatio] = &[
        AspectRatio::Landscape16x9,
        AspectRatio::Portrait9x16,
        AspectRatio::Square,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait3x4,
        AspectRatio::Ultrawide21x9,
        AspectRatio::Adaptive,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Ultrawide21x9 => "21:9",
            AspectRatio::Adaptive => "adaptive",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == lower)
            .ok_or_else(|| AspectRatioParseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unknown aspect ratio: {0}")]
pub struct AspectRatioParseError(String);

/// Output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum Resolution {
    #[serde(rename = "480p")]
    P480,
    #[default]
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
}

impl Resolution {
    pub const ALL: &'static [Resolution] = &[Resolution::P480, Resolution::P720, Resolution::P1080];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::P480 => "480p",
            Resolution::P720 => "720p",
            Resolution::P1080 => "1080p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = ResolutionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == lower)
            .ok_or_else(|| ResolutionParseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unknown resolution: {0}")]
pub struct ResolutionParseError(String);

/// Reasons a generation request is rejected before it reaches the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("model identifier is empty")]
    EmptyModel,

    #[error("duration {0}s is outside the supported 4-12s range")]
    DurationOutOfRange(u32),

    #[error("unsupported image format: {0} (supported: jpg, jpeg, png, webp)")]
    UnsupportedImageFormat(String),
}

/// An image handed to the service as the first frame of a clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ImageSource {
    /// Remote image reachable by the service
    Url(String),
    /// Inline `data:` URI
    DataUri(String),
    /// Local file, inlined as a data URI when the request is sent
    LocalPath(PathBuf),
}

impl ImageSource {
    /// Classify a user-supplied image reference.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.starts_with("http://") || value.starts_with("https://") {
            ImageSource::Url(value.to_string())
        } else if value.starts_with("data:") {
            ImageSource::DataUri(value.to_string())
        } else {
            ImageSource::LocalPath(PathBuf::from(value))
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ImageSource::LocalPath(_))
    }

    /// Short form for logs. Data URIs are truncated.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Url(url) => url.clone(),
            ImageSource::DataUri(uri) => {
                let head: String = uri.chars().take(32).collect();
                format!("{}... ({} bytes)", head, uri.len())
            }
            ImageSource::LocalPath(path) => path.display().to_string(),
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// MIME type for a local image, based on its extension.
pub fn image_mime_type(path: &Path) -> Result<&'static str, ValidationError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "png" => Ok("image/png"),
        "webp" => Ok("image/webp"),
        _ => Err(ValidationError::UnsupportedImageFormat(format!(".{}", ext))),
    }
}

/// Generation options shared by every step of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationParams {
    /// Model identifier
    pub model: String,
    /// Clip duration in seconds
    pub duration_secs: u32,
    pub ratio: AspectRatio,
    pub resolution: Resolution,
    /// Generate a synchronized audio track
    pub generate_audio: bool,
    /// Seed reused for every step to keep the style consistent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Lock the camera position
    #[serde(default)]
    pub camera_fixed: bool,
    /// Ask the service to watermark the output
    #[serde(default)]
    pub watermark: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            duration_secs: DEFAULT_DURATION_SECS,
            ratio: AspectRatio::default(),
            resolution: Resolution::default(),
            generate_audio: true,
            seed: None,
            camera_fixed: false,
            watermark: false,
        }
    }
}

impl GenerationParams {
    /// Whether the configured model can produce audio.
    pub fn model_supports_audio(&self) -> bool {
        self.model != LITE_I2V_MODEL
    }

    /// Drop options the model cannot honor.
    ///
    /// Returns the adjusted params and whether anything changed.
    pub fn normalized(mut self) -> (Self, bool) {
        if self.generate_audio && !self.model_supports_audio() {
            self.generate_audio = false;
            return (self, true);
        }
        (self, false)
    }

    /// Validate the option values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.model.trim().is_empty() {
            return Err(ValidationError::EmptyModel);
        }
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&self.duration_secs) {
            return Err(ValidationError::DurationOutOfRange(self.duration_secs));
        }
        Ok(())
    }
}

/// One request to the generation service. Built fresh per chain step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationRequest {
    pub prompt: String,
    /// First frame of the clip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_image: Option<ImageSource>,
    pub model: String,
    pub duration_secs: u32,
    pub ratio: AspectRatio,
    pub resolution: Resolution,
    pub generate_audio: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    pub camera_fixed: bool,
    pub watermark: bool,
    /// Ask the service to return the clip's last frame
    pub return_last_frame: bool,
}

impl GenerationRequest {
    /// Build a request from a prompt, an optional first frame and shared params.
    pub fn new(
        prompt: impl Into<String>,
        input_image: Option<ImageSource>,
        params: &GenerationParams,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            input_image,
            model: params.model.clone(),
            duration_secs: params.duration_secs,
            ratio: params.ratio,
            resolution: params.resolution,
            generate_audio: params.generate_audio,
            seed: params.seed,
            camera_fixed: params.camera_fixed,
            watermark: params.watermark,
            return_last_frame: false,
        }
    }

    /// Request the continuation artifact (last frame) from the service.
    pub fn with_last_frame(mut self) -> Self {
        self.return_last_frame = true;
        self
    }

    /// Validate the request before it is sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.prompt.trim().is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError::EmptyModel);
        }
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&self.duration_secs) {
            return Err(ValidationError::DurationOutOfRange(self.duration_secs));
        }
        if let Some(ImageSource::LocalPath(path)) = &self.input_image {
            image_mime_type(path)?;
        }
        Ok(())
    }
}
