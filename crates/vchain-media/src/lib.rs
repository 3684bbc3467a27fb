#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for the generation chain.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - A runner with per-invocation timeouts, cancellation and captured diagnostics
//! - Last-frame extraction from a finished clip
//! - Lossless container-level concatenation of clips

pub mod command;
pub mod concat;
pub mod error;
pub mod frame;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner, MediaTool};
pub use concat::{escape_manifest_path, ConcatManifest, Concatenator, DEFAULT_CONCAT_TIMEOUT};
pub use error::{ConcatError, MediaError, MediaResult};
pub use frame::{last_frame_path, LastFrameExtractor, DEFAULT_FRAME_TIMEOUT};
