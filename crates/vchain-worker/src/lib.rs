//! Chained video generation.
//!
//! This crate provides:
//! - Task polling with a deadline
//! - Continuation frames (service-provided or extracted locally)
//! - The chain orchestrator and final assembly
//! - Structured chain events
//! - Environment configuration and prompt loading

pub mod config;
pub mod continuation;
pub mod error;
pub mod events;
pub mod naming;
pub mod orchestrator;
pub mod poller;
pub mod prompts;
pub mod retry;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ChainConfig, PollConfig, RunInputs};
pub use continuation::ContinuationExtractor;
pub use error::{ConfigError, ConfigResult, StepError, StepResult};
pub use events::{
    ChainEvent, ChainEventKind, ChainObserver, ChannelObserver, NoopObserver, RecordingObserver,
    TracingObserver,
};
pub use orchestrator::ChainOrchestrator;
pub use poller::TaskPoller;
pub use prompts::{load_prompts, parse_prompts};
