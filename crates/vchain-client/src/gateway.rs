//! Seams between the chain and the remote service.

use std::path::Path;

use async_trait::async_trait;
use vchain_models::{GenerationRequest, TaskHandle, TaskStatus};

use crate::error::GatewayResult;

/// Creates generation tasks and reports their status.
///
/// Implementations keep no state between calls and never retry.
#[async_trait]
pub trait TaskGateway: Send + Sync {
    /// Submit a generation task.
    async fn create(&self, request: &GenerationRequest) -> GatewayResult<TaskHandle>;

    /// Current status of a task. Safe to call repeatedly.
    async fn status(&self, handle: &TaskHandle) -> GatewayResult<TaskStatus>;
}

/// Fetches a finished clip to local storage.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Download `url` to `dest`, returning the number of bytes written.
    ///
    /// `dest` only appears once the transfer is complete.
    async fn download(&self, url: &str, dest: &Path) -> GatewayResult<u64>;
}
