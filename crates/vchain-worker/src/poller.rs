//! Drives one remote task to a terminal state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};
use vchain_client::TaskGateway;
use vchain_models::{TaskHandle, TaskOutput, TaskStatus};

use crate::config::PollConfig;
use crate::error::{StepError, StepResult};

/// Polls task status at a fixed interval until the task finishes or the
/// deadline passes. The remote task is never cancelled.
#[derive(Clone)]
pub struct TaskPoller {
    gateway: Arc<dyn TaskGateway>,
    config: PollConfig,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl TaskPoller {
    pub fn new(gateway: Arc<dyn TaskGateway>, config: PollConfig) -> Self {
        Self {
            gateway,
            config,
            cancel_rx: None,
        }
    }

    /// Stop waiting when the signal turns true.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Wait for `handle` to finish.
    ///
    /// `on_tick` sees every observed status with the time elapsed since the
    /// first poll. Status-call errors end the wait immediately.
    pub async fn wait<F>(&self, handle: &TaskHandle, mut on_tick: F) -> StepResult<TaskOutput>
    where
        F: FnMut(&TaskStatus, Duration),
    {
        let start = Instant::now();

        loop {
            let status = self
                .gateway
                .status(handle)
                .await
                .map_err(StepError::Gateway)?;
            let elapsed = start.elapsed();
            on_tick(&status, elapsed);

            match status {
                TaskStatus::Succeeded(output) => return Ok(output),
                TaskStatus::Failed { message } => {
                    return Err(StepError::TaskFailed {
                        handle: handle.clone(),
                        message,
                    })
                }
                TaskStatus::Unknown { raw } => {
                    warn!(task_id = %handle, "Unrecognized task status {:?}, still waiting", raw);
                }
                TaskStatus::Queued | TaskStatus::Running => {}
            }

            if elapsed >= self.config.timeout {
                return Err(StepError::PollTimeout {
                    handle: handle.clone(),
                    elapsed,
                });
            }

            // Last poll lands exactly on the deadline
            let delay = self.config.interval.min(self.config.timeout - elapsed);
            debug!(task_id = %handle, "Next poll in {:?}", delay);
            self.sleep_or_cancel(delay).await?;
        }
    }

    async fn sleep_or_cancel(&self, delay: Duration) -> StepResult<()> {
        let Some(mut rx) = self.cancel_rx.clone() else {
            tokio::time::sleep(delay).await;
            return Ok(());
        };
        if *rx.borrow() {
            return Err(StepError::Cancelled);
        }

        let cancelled = tokio::select! {
            _ = tokio::time::sleep(delay) => return Ok(()),
            changed = rx.wait_for(|cancelled| *cancelled) => changed.is_ok(),
        };
        if cancelled {
            return Err(StepError::Cancelled);
        }

        // Sender dropped; nothing can cancel us anymore
        tokio::time::sleep(delay).await;
        Ok(())
    }
}
