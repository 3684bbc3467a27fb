//! Shared data models for the vchain generation pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Generation requests and their option sets
//! - Remote task handles and statuses
//! - Chain steps, failures and run results

pub mod chain;
pub mod generation;
pub mod task;

// Re-export common types
pub use chain::{ChainFailure, ChainResult, ChainStep, ContinuationArtifact, FailureKind};
pub use generation::{
    image_mime_type, AspectRatio, AspectRatioParseError, GenerationParams, GenerationRequest,
    ImageSource, Resolution, ResolutionParseError, ValidationError, DEFAULT_MODEL,
    LITE_I2V_MODEL,
};
pub use task::{TaskHandle, TaskOutput, TaskStatus};
