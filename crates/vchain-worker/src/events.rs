//! Structured chain events.
//!
//! The orchestrator reports everything it does as a [`ChainEvent`] to an
//! injected [`ChainObserver`]. The binary logs them through `tracing`;
//! embedders can forward them over a channel instead.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use vchain_models::FailureKind;

/// One thing that happened during a chain run.
#[derive(Debug, Clone, Serialize)]
pub struct ChainEvent {
    pub run_id: Uuid,
    pub at: DateTime<Utc>,
    /// Zero-based step index, for step-scoped events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
    #[serde(flatten)]
    pub kind: ChainEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChainEventKind {
    RunStarted {
        total_steps: usize,
        model: String,
    },
    StepStarted {
        prompt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        input: Option<String>,
    },
    TaskCreated {
        task_id: String,
    },
    TaskPolled {
        task_id: String,
        status: String,
        elapsed_secs: u64,
    },
    ClipDownloaded {
        path: String,
        bytes: u64,
    },
    ContinuationResolved {
        artifact: String,
        remote: bool,
    },
    ContinuationMissing {
        reason: String,
    },
    StepCompleted {
        media_path: String,
    },
    StepFailed {
        kind: FailureKind,
        message: String,
    },
    ConcatStarted {
        inputs: usize,
        output: String,
    },
    ConcatCompleted {
        output: String,
    },
    ConcatFailed {
        message: String,
    },
    RunFinished {
        completed: usize,
        total_steps: usize,
    },
}

impl ChainEvent {
    pub fn new(run_id: Uuid, step: Option<usize>, kind: ChainEventKind) -> Self {
        Self {
            run_id,
            at: Utc::now(),
            step,
            kind,
        }
    }
}

/// Receives chain events. Must not block.
pub trait ChainObserver: Send + Sync {
    fn on_event(&self, event: &ChainEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ChainObserver for NoopObserver {
    fn on_event(&self, _event: &ChainEvent) {}
}

/// Logs events as structured `tracing` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ChainObserver for TracingObserver {
    fn on_event(&self, event: &ChainEvent) {
        let run_id = event.run_id;
        // 1-based in logs, like the summary
        let step = event.step.map(|s| s + 1).unwrap_or(0);

        match &event.kind {
            ChainEventKind::RunStarted { total_steps, model } => {
                info!(%run_id, total_steps, %model, "Chain started");
            }
            ChainEventKind::StepStarted { prompt, input } => {
                info!(
                    %run_id,
                    step,
                    input = input.as_deref().unwrap_or("none"),
                    "Step started: {}", prompt
                );
            }
            ChainEventKind::TaskCreated { task_id } => {
                info!(%run_id, step, %task_id, "Task created");
            }
            ChainEventKind::TaskPolled {
                task_id,
                status,
                elapsed_secs,
            } => {
                if status == "unknown" {
                    warn!(%run_id, step, %task_id, elapsed_secs, "Task in unrecognized state");
                } else {
                    info!(%run_id, step, %task_id, %status, elapsed_secs, "[{}s] Task {}", elapsed_secs, status);
                }
            }
            ChainEventKind::ClipDownloaded { path, bytes } => {
                info!(%run_id, step, %path, bytes, "Clip downloaded");
            }
            ChainEventKind::ContinuationResolved { artifact, remote } => {
                debug!(%run_id, step, remote, "Continuation frame: {}", artifact);
            }
            ChainEventKind::ContinuationMissing { reason } => {
                warn!(%run_id, step, "No continuation frame: {}", reason);
            }
            ChainEventKind::StepCompleted { media_path } => {
                info!(%run_id, step, %media_path, "Step completed");
            }
            ChainEventKind::StepFailed { kind, message } => {
                error!(%run_id, step, kind = %kind, "Step failed: {}", message);
            }
            ChainEventKind::ConcatStarted { inputs, output } => {
                info!(%run_id, inputs, %output, "Concatenating clips");
            }
            ChainEventKind::ConcatCompleted { output } => {
                info!(%run_id, %output, "Concatenation complete");
            }
            ChainEventKind::ConcatFailed { message } => {
                error!(%run_id, "Concatenation failed: {}", message);
            }
            ChainEventKind::RunFinished {
                completed,
                total_steps,
            } => {
                info!(%run_id, completed, total_steps, "Chain finished");
            }
        }
    }
}

/// Forwards events over a bounded channel. Events are dropped when the
/// receiver lags.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::Sender<ChainEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::Sender<ChainEvent>) -> Self {
        Self { tx }
    }

    /// Create an observer and the receiving end of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ChainEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl ChainObserver for ChannelObserver {
    fn on_event(&self, event: &ChainEvent) {
        if let Err(e) = self.tx.try_send(event.clone()) {
            debug!("Dropping chain event: {}", e);
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ChainEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChainEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn kinds(&self) -> Vec<ChainEventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }
}

impl ChainObserver for RecordingObserver {
    fn on_event(&self, event: &ChainEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}
