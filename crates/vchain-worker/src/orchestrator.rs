//! Chain orchestration.
//!
//! A chain is a fold over prompts carrying the current first frame. Each
//! step creates a task, waits for it, downloads the clip and resolves the
//! frame the next step starts from. The first failure stops the chain;
//! completed clips are always kept and, when there are at least two, joined
//! into one file.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use tokio::sync::watch;
use tracing::{info, warn, Instrument};
use uuid::Uuid;
use vchain_client::{GatewayError, MediaDownloader, TaskGateway};
use vchain_media::{Concatenator, LastFrameExtractor, MediaTool};
use vchain_models::{
    ChainFailure, ChainResult, ChainStep, FailureKind, GenerationParams, GenerationRequest,
    ImageSource, TaskHandle,
};

use crate::config::ChainConfig;
use crate::continuation::ContinuationExtractor;
use crate::error::{StepError, StepResult};
use crate::events::{ChainEvent, ChainEventKind, ChainObserver, TracingObserver};
use crate::naming;
use crate::poller::TaskPoller;
use crate::retry::{retry_async_when, RetryConfig};

/// Emits events for one run.
struct RunContext<'a> {
    run_id: Uuid,
    observer: &'a dyn ChainObserver,
}

impl RunContext<'_> {
    fn emit(&self, step: Option<usize>, kind: ChainEventKind) {
        self.observer
            .on_event(&ChainEvent::new(self.run_id, step, kind));
    }
}

/// A completed step plus why it left no frame behind, if it did not.
struct StepOutcome {
    step: ChainStep,
    missing_frame: Option<String>,
}

/// Runs chains of dependent generation steps.
pub struct ChainOrchestrator {
    gateway: Arc<dyn TaskGateway>,
    downloader: Arc<dyn MediaDownloader>,
    poller: TaskPoller,
    continuation: ContinuationExtractor,
    concatenator: Concatenator,
    config: ChainConfig,
    observer: Arc<dyn ChainObserver>,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl ChainOrchestrator {
    /// Create an orchestrator. `tool` runs FFmpeg for frame extraction and
    /// concatenation.
    pub fn new(
        gateway: Arc<dyn TaskGateway>,
        downloader: Arc<dyn MediaDownloader>,
        tool: Arc<dyn MediaTool>,
        config: ChainConfig,
    ) -> Self {
        let poller = TaskPoller::new(gateway.clone(), config.poll);
        let continuation = ContinuationExtractor::new(
            LastFrameExtractor::new(tool.clone()).with_timeout(config.frame_timeout),
        );
        let concatenator = Concatenator::new(tool).with_timeout(config.concat_timeout);

        Self {
            gateway,
            downloader,
            poller,
            continuation,
            concatenator,
            config,
            observer: Arc::new(TracingObserver),
            cancel_rx: None,
        }
    }

    /// Report events to `observer` instead of the log.
    pub fn with_observer(mut self, observer: Arc<dyn ChainObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Stop the chain when the signal turns true.
    ///
    /// Checked between steps and while waiting for a task.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.poller = self.poller.clone().with_cancel(cancel_rx.clone());
        self.cancel_rx = Some(cancel_rx);
        self
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_rx
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }

    /// Run one chain. Never fails: the result describes how far it got.
    pub async fn run(
        &self,
        prompts: &[String],
        initial_frame: Option<ImageSource>,
        params: &GenerationParams,
    ) -> ChainResult {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("chain", run_id = %run_id);
        self.run_inner(run_id, prompts, initial_frame, params)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        prompts: &[String],
        initial_frame: Option<ImageSource>,
        params: &GenerationParams,
    ) -> ChainResult {
        let ctx = RunContext {
            run_id,
            observer: self.observer.as_ref(),
        };

        let (params, adjusted) = params.clone().normalized();
        if adjusted {
            warn!(
                "Model {} does not support audio, generating without it",
                params.model
            );
        }

        let mut result = ChainResult::new(prompts.len());
        ctx.emit(
            None,
            ChainEventKind::RunStarted {
                total_steps: prompts.len(),
                model: params.model.clone(),
            },
        );

        let mut current_frame = initial_frame;
        let mut missing_frame: Option<String> = None;

        for (index, prompt) in prompts.iter().enumerate() {
            if self.is_cancelled() {
                self.record_failure(&ctx, &mut result, index, prompt, StepError::Cancelled);
                break;
            }
            if index > 0 && current_frame.is_none() {
                let reason = missing_frame
                    .take()
                    .unwrap_or_else(|| "previous step produced no frame".to_string());
                self.record_failure(
                    &ctx,
                    &mut result,
                    index,
                    prompt,
                    StepError::ExtractionUnavailable(reason),
                );
                break;
            }

            match self
                .run_step(&ctx, index, prompt, current_frame.take(), &params)
                .await
            {
                Ok(outcome) => {
                    current_frame = outcome
                        .step
                        .continuation
                        .as_ref()
                        .map(|c| c.to_image_source());
                    missing_frame = outcome.missing_frame;
                    result.completed.push(outcome.step);
                }
                Err(e) => {
                    self.record_failure(&ctx, &mut result, index, prompt, e);
                    break;
                }
            }
        }

        self.assemble(&ctx, &mut result).await;

        ctx.emit(
            None,
            ChainEventKind::RunFinished {
                completed: result.completed.len(),
                total_steps: result.total_steps,
            },
        );
        result
    }

    async fn run_step(
        &self,
        ctx: &RunContext<'_>,
        index: usize,
        prompt: &str,
        input: Option<ImageSource>,
        params: &GenerationParams,
    ) -> StepResult<StepOutcome> {
        ctx.emit(
            Some(index),
            ChainEventKind::StepStarted {
                prompt: prompt.to_string(),
                input: input.as_ref().map(|i| i.describe()),
            },
        );

        let request = GenerationRequest::new(prompt, input.clone(), params).with_last_frame();
        let handle = self
            .gateway
            .create(&request)
            .await
            .map_err(StepError::from_create)?;
        ctx.emit(
            Some(index),
            ChainEventKind::TaskCreated {
                task_id: handle.to_string(),
            },
        );

        let output = self
            .poller
            .wait(&handle, |status, elapsed| {
                ctx.emit(
                    Some(index),
                    ChainEventKind::TaskPolled {
                        task_id: handle.to_string(),
                        status: status.label().to_string(),
                        elapsed_secs: elapsed.as_secs(),
                    },
                )
            })
            .await?;

        let media_path = naming::clip_path(&self.config.output_dir, index, prompt, Local::now());
        let bytes = self
            .download(&handle, &output.video_url, &media_path)
            .await?;
        ctx.emit(
            Some(index),
            ChainEventKind::ClipDownloaded {
                path: media_path.display().to_string(),
                bytes,
            },
        );

        let (continuation, missing_frame) =
            match self.continuation.resolve(&output, &media_path).await {
                Ok(artifact) => {
                    ctx.emit(
                        Some(index),
                        ChainEventKind::ContinuationResolved {
                            artifact: artifact.to_string(),
                            remote: artifact.is_remote(),
                        },
                    );
                    (Some(artifact), None)
                }
                Err(e) => {
                    let reason = e.diagnostic();
                    ctx.emit(
                        Some(index),
                        ChainEventKind::ContinuationMissing {
                            reason: reason.clone(),
                        },
                    );
                    (None, Some(reason))
                }
            };

        ctx.emit(
            Some(index),
            ChainEventKind::StepCompleted {
                media_path: media_path.display().to_string(),
            },
        );

        Ok(StepOutcome {
            step: ChainStep {
                index,
                prompt: prompt.to_string(),
                input,
                task_id: handle,
                media_path,
                continuation,
            },
            missing_frame,
        })
    }

    /// Download with bounded retries on transient errors.
    async fn download(
        &self,
        handle: &TaskHandle,
        url: &str,
        dest: &std::path::Path,
    ) -> StepResult<u64> {
        let retry = RetryConfig::new(format!("download {}", handle))
            .with_max_retries(self.config.download_retries)
            .with_base_delay(self.config.download_backoff);

        retry_async_when(
            &retry,
            || self.downloader.download(url, dest),
            |e: &GatewayError| e.is_retryable(),
        )
        .await
        .into_result()
        .map_err(|e| StepError::download(e.to_string()))
    }

    fn record_failure(
        &self,
        ctx: &RunContext<'_>,
        result: &mut ChainResult,
        index: usize,
        prompt: &str,
        err: StepError,
    ) {
        let kind = err.kind();
        let message = err.message();
        ctx.emit(
            Some(index),
            ChainEventKind::StepFailed {
                kind,
                message: message.clone(),
            },
        );
        result.failure = Some(ChainFailure {
            index,
            prompt: prompt.to_string(),
            kind,
            message,
        });
    }

    /// Join the completed clips when there is more than one.
    async fn assemble(&self, ctx: &RunContext<'_>, result: &mut ChainResult) {
        if !self.config.concat_enabled {
            return;
        }
        let cancelled = result
            .failure
            .as_ref()
            .filter(|f| f.kind == FailureKind::Cancelled);
        if let Some(failure) = cancelled {
            info!(
                "Skipping concatenation: cancelled at step {}",
                failure.index + 1
            );
            return;
        }
        if result.completed.len() < 2 {
            if result.total_steps > 1 {
                info!(
                    "Skipping concatenation: {} clip(s) completed",
                    result.completed.len()
                );
            }
            return;
        }

        let output: PathBuf = self
            .config
            .concat_output
            .clone()
            .unwrap_or_else(|| naming::concat_path(&self.config.output_dir, Local::now()));
        let inputs = result.media_paths();
        ctx.emit(
            None,
            ChainEventKind::ConcatStarted {
                inputs: inputs.len(),
                output: output.display().to_string(),
            },
        );

        match self.concatenator.concatenate(&inputs, &output).await {
            Ok(path) => {
                ctx.emit(
                    None,
                    ChainEventKind::ConcatCompleted {
                        output: path.display().to_string(),
                    },
                );
                result.concatenated = Some(path);
            }
            Err(e) => {
                ctx.emit(
                    None,
                    ChainEventKind::ConcatFailed {
                        message: e.to_string(),
                    },
                );
                result.concat_error = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollConfig;
    use crate::events::RecordingObserver;
    use crate::testing::{RecordingDownloader, ScriptedGateway, ScriptedTool};
    use std::time::Duration;
    use tempfile::TempDir;
    use vchain_media::ConcatManifest;
    use vchain_models::{ContinuationArtifact, TaskStatus, LITE_I2V_MODEL};

    struct Harness {
        gateway: Arc<ScriptedGateway>,
        downloader: Arc<RecordingDownloader>,
        tool: Arc<ScriptedTool>,
        observer: Arc<RecordingObserver>,
        dir: TempDir,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                gateway: ScriptedGateway::new(),
                downloader: RecordingDownloader::new(),
                tool: ScriptedTool::new(),
                observer: Arc::new(RecordingObserver::new()),
                dir: TempDir::new().unwrap(),
            }
        }

        fn config(&self) -> ChainConfig {
            ChainConfig {
                poll: PollConfig {
                    interval: Duration::from_millis(5),
                    timeout: Duration::from_secs(5),
                },
                output_dir: self.dir.path().to_path_buf(),
                download_backoff: Duration::from_millis(1),
                ..Default::default()
            }
        }

        fn orchestrator(&self, config: ChainConfig) -> ChainOrchestrator {
            ChainOrchestrator::new(
                self.gateway.clone(),
                self.downloader.clone(),
                self.tool.clone(),
                config,
            )
            .with_observer(self.observer.clone())
        }

        async fn run(&self, prompts: &[&str], initial: Option<ImageSource>) -> ChainResult {
            let prompts: Vec<String> = prompts.iter().map(|p| p.to_string()).collect();
            self.orchestrator(self.config())
                .run(&prompts, initial, &GenerationParams::default())
                .await
        }
    }

    fn start_frame() -> ImageSource {
        ImageSource::Url("https://cdn.test/start.jpg".into())
    }

    #[tokio::test]
    async fn test_all_steps_chain_frames() {
        let h = Harness::new();
        let result = h
            .run(&["wake up", "stretch", "run away"], Some(start_frame()))
            .await;

        assert!(result.is_complete());
        assert_eq!(result.completed.len(), 3);

        let requests = h.gateway.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].input_image, Some(start_frame()));
        for i in 1..3 {
            let previous = result.completed[i - 1].continuation.clone().unwrap();
            assert_eq!(requests[i].input_image, Some(previous.to_image_source()));
            assert_eq!(result.completed[i].input, Some(previous.to_image_source()));
        }
        assert!(requests.iter().all(|r| r.return_last_frame));

        // Service frames were used, so FFmpeg only ran for the join
        assert!(h.tool.frame_calls().is_empty());
        assert_eq!(h.tool.concat_calls().len(), 1);
        assert!(result.concatenated.is_some());
        assert_eq!(result.final_output(), result.concatenated.as_ref());
    }

    #[tokio::test]
    async fn test_steps_are_strictly_sequential() {
        let h = Harness::new();
        h.gateway.script(vec![
            TaskStatus::Queued,
            TaskStatus::Running,
            ScriptedGateway::succeeded("https://cdn.test/a.mp4", Some("https://cdn.test/a.jpg")),
        ]);
        let result = h.run(&["one", "two"], None).await;
        assert!(result.is_complete());

        let kinds = h.observer.kinds();
        let first_completed = kinds
            .iter()
            .position(|k| matches!(k, ChainEventKind::StepCompleted { .. }))
            .unwrap();
        let second_created = kinds
            .iter()
            .enumerate()
            .filter(|(_, k)| matches!(k, ChainEventKind::TaskCreated { .. }))
            .nth(1)
            .map(|(i, _)| i)
            .unwrap();
        assert!(first_completed < second_created);
        assert_eq!(
            h.gateway.status_calls(&result.completed[0].task_id),
            3
        );
    }

    #[tokio::test]
    async fn test_failure_stops_chain() {
        let h = Harness::new();
        h.gateway.script(vec![ScriptedGateway::succeeded(
            "https://cdn.test/a.mp4",
            Some("https://cdn.test/a.jpg"),
        )]);
        h.gateway.script(vec![
            TaskStatus::Running,
            TaskStatus::Failed {
                message: "content policy".into(),
            },
        ]);

        let result = h.run(&["one", "two", "three"], None).await;

        assert_eq!(result.completed.len(), 1);
        let failure = result.failure.clone().unwrap();
        assert_eq!(failure.index, 1);
        assert_eq!(failure.kind, FailureKind::TaskFailed);
        assert_eq!(failure.message, "content policy");
        assert_eq!(h.gateway.requests().len(), 2);
        assert_eq!(h.downloader.downloads().len(), 1);
        // One clip is not worth joining
        assert!(h.tool.concat_calls().is_empty());
        assert!(result.concatenated.is_none());
        assert!(result.concat_error.is_none());
        assert!(result.to_string().contains("[3] skipped"));
    }

    #[tokio::test]
    async fn test_local_extraction_feeds_next_step() {
        let h = Harness::new();
        h.gateway
            .script(vec![ScriptedGateway::succeeded("https://cdn.test/a.mp4", None)]);

        let result = h.run(&["one", "two"], None).await;
        assert!(result.is_complete());

        let media = &result.completed[0].media_path;
        let frame_calls = h.tool.frame_calls();
        assert_eq!(frame_calls.len(), 1);
        assert_eq!(&frame_calls[0].input, media);

        let frame = match result.completed[0].continuation.clone().unwrap() {
            ContinuationArtifact::LocalFrame(path) => path,
            other => panic!("unexpected: {:?}", other),
        };
        assert_eq!(
            h.gateway.requests()[1].input_image,
            Some(ImageSource::LocalPath(frame))
        );
    }

    #[tokio::test]
    async fn test_missing_frame_blocks_next_step() {
        let h = Harness::new();
        h.tool.fail_frames();
        h.gateway
            .script(vec![ScriptedGateway::succeeded("https://cdn.test/a.mp4", None)]);

        let result = h.run(&["one", "two", "three"], None).await;

        assert_eq!(result.completed.len(), 1);
        assert!(result.completed[0].continuation.is_none());
        let failure = result.failure.clone().unwrap();
        assert_eq!(failure.index, 1);
        assert_eq!(failure.kind, FailureKind::ExtractionUnavailable);
        assert!(failure.message.contains("Invalid data"));
        // The blocked step never reached the service
        assert_eq!(h.gateway.requests().len(), 1);
        assert!(result.to_string().contains("[2] blocked"));
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_blocks_next_step() {
        let h = Harness::new();
        h.tool.missing();
        h.gateway
            .script(vec![ScriptedGateway::succeeded("https://cdn.test/a.mp4", None)]);

        let result = h.run(&["one", "two"], None).await;

        assert_eq!(result.completed.len(), 1);
        let failure = result.failure.clone().unwrap();
        assert_eq!(failure.index, 1);
        assert_eq!(failure.kind, FailureKind::ExtractionUnavailable);
        assert!(failure.message.contains("FFmpeg not found"));
        assert_eq!(h.gateway.requests().len(), 1);
        assert!(h.observer.kinds().iter().any(|k| matches!(
            k,
            ChainEventKind::ContinuationMissing { .. }
        )));
    }

    #[tokio::test]
    async fn test_missing_frame_on_last_step_is_fine() {
        let h = Harness::new();
        h.tool.fail_frames();
        h.gateway
            .script(vec![ScriptedGateway::succeeded("https://cdn.test/a.mp4", None)]);

        let result = h.run(&["only"], None).await;
        assert!(result.is_complete());
        assert_eq!(result.final_output(), Some(&result.completed[0].media_path));
        assert!(h.tool.concat_calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_request() {
        let h = Harness::new();
        h.gateway.reject_next(400, "InvalidParameter: duration");

        let result = h.run(&["one", "two"], None).await;
        assert!(result.completed.is_empty());
        let failure = result.failure.unwrap();
        assert_eq!(failure.index, 0);
        assert_eq!(failure.kind, FailureKind::InvalidRequest);
        assert!(h.downloader.downloads().is_empty());
    }

    #[tokio::test]
    async fn test_poll_timeout_reported() {
        let h = Harness::new();
        h.gateway.script(vec![TaskStatus::Running]);
        let mut config = h.config();
        config.poll.timeout = Duration::from_millis(20);

        let result = h
            .orchestrator(config)
            .run(&["one".to_string()], None, &GenerationParams::default())
            .await;
        assert_eq!(result.failure.unwrap().kind, FailureKind::PollTimeout);
    }

    #[tokio::test]
    async fn test_download_retries_transient_errors() {
        let h = Harness::new();
        h.downloader.fail_next(503);

        let result = h.run(&["one"], None).await;
        assert!(result.is_complete());
        assert_eq!(h.downloader.downloads().len(), 2);
        assert!(result.completed[0].media_path.exists());
    }

    #[tokio::test]
    async fn test_download_gives_up_on_missing_media() {
        let h = Harness::new();
        h.downloader.fail_next(404);

        let result = h.run(&["one", "two"], None).await;
        assert_eq!(result.failure.unwrap().kind, FailureKind::Download);
        assert_eq!(h.downloader.downloads().len(), 1);
    }

    #[tokio::test]
    async fn test_concat_lists_clips_in_order() {
        let h = Harness::new();
        let result = h.run(&["a", "b", "c"], None).await;

        let calls = h.tool.concat_calls();
        assert_eq!(calls.len(), 1);
        let listed = ConcatManifest::parse(calls[0].manifest.as_deref().unwrap());
        let listed_names: Vec<_> = listed
            .entries()
            .iter()
            .map(|p| p.file_name().unwrap().to_owned())
            .collect();
        let clip_names: Vec<_> = result
            .media_paths()
            .iter()
            .map(|p| p.file_name().unwrap().to_owned())
            .collect();
        assert_eq!(listed_names, clip_names);

        let joined = result.concatenated.clone().unwrap();
        assert!(!result.media_paths().contains(&joined));
        assert!(joined
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("continuous_video_"));
    }

    #[tokio::test]
    async fn test_concat_failure_keeps_clips() {
        let h = Harness::new();
        h.tool.fail_concat();

        let result = h.run(&["a", "b"], None).await;
        assert!(result.is_complete());
        assert!(result.concatenated.is_none());
        assert!(result.concat_error.as_ref().unwrap().contains("Invalid data"));
        assert!(result.media_paths().iter().all(|p| p.exists()));
    }

    #[tokio::test]
    async fn test_concat_disabled_and_configured_output() {
        let h = Harness::new();
        let prompts = vec!["a".to_string(), "b".to_string()];

        let mut disabled = h.config();
        disabled.concat_enabled = false;
        let result = h
            .orchestrator(disabled)
            .run(&prompts, None, &GenerationParams::default())
            .await;
        assert!(result.concatenated.is_none());
        assert!(h.tool.concat_calls().is_empty());

        let mut explicit = h.config();
        let target = h.dir.path().join("final").join("story.mp4");
        explicit.concat_output = Some(target.clone());
        let result = h
            .orchestrator(explicit)
            .run(&prompts, None, &GenerationParams::default())
            .await;
        assert_eq!(result.concatenated, Some(target));
    }

    #[tokio::test]
    async fn test_cancel_before_next_step() {
        let h = Harness::new();
        let (tx, rx) = watch::channel(true);
        let prompts = vec!["a".to_string(), "b".to_string()];

        let result = h
            .orchestrator(h.config())
            .with_cancel(rx)
            .run(&prompts, None, &GenerationParams::default())
            .await;
        drop(tx);

        assert!(result.completed.is_empty());
        let failure = result.failure.unwrap();
        assert_eq!(failure.index, 0);
        assert_eq!(failure.kind, FailureKind::Cancelled);
        assert!(h.gateway.requests().is_empty());
    }

    /// Raises the cancel signal once a given step completes.
    struct CancelAfterStep {
        step: usize,
        tx: watch::Sender<bool>,
    }

    impl ChainObserver for CancelAfterStep {
        fn on_event(&self, event: &ChainEvent) {
            if event.step == Some(self.step)
                && matches!(event.kind, ChainEventKind::StepCompleted { .. })
            {
                let _ = self.tx.send(true);
            }
        }
    }

    #[tokio::test]
    async fn test_cancel_mid_chain_skips_concat() {
        let h = Harness::new();
        let (tx, rx) = watch::channel(false);
        let prompts = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let result = h
            .orchestrator(h.config())
            .with_observer(Arc::new(CancelAfterStep { step: 1, tx }))
            .with_cancel(rx)
            .run(&prompts, None, &GenerationParams::default())
            .await;

        assert_eq!(result.completed.len(), 2);
        let failure = result.failure.clone().unwrap();
        assert_eq!(failure.index, 2);
        assert_eq!(failure.kind, FailureKind::Cancelled);
        assert!(h.tool.concat_calls().is_empty());
        assert!(result.concatenated.is_none());
        assert!(result.concat_error.is_none());
        assert!(result.media_paths().iter().all(|p| p.exists()));
    }

    #[tokio::test]
    async fn test_shared_params_reused_every_step() {
        let h = Harness::new();
        let params = GenerationParams {
            seed: Some(77),
            model: LITE_I2V_MODEL.to_string(),
            ..Default::default()
        };
        let prompts = vec!["a".to_string(), "b".to_string()];
        h.orchestrator(h.config())
            .run(&prompts, Some(start_frame()), &params)
            .await;

        let requests = h.gateway.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.seed == Some(77)));
        assert!(requests.iter().all(|r| !r.generate_audio));
        assert!(requests.iter().all(|r| r.model == LITE_I2V_MODEL));
    }

    #[tokio::test]
    async fn test_clip_naming_and_events() {
        let h = Harness::new();
        let result = h.run(&["a fox runs"], None).await;

        let name = result.completed[0]
            .media_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();
        assert!(name.starts_with("01_a_fox_runs_"));
        assert!(name.ends_with(".mp4"));

        let events = h.observer.events();
        let run_id = events[0].run_id;
        assert!(events.iter().all(|e| e.run_id == run_id));
        assert!(matches!(
            events[0].kind,
            ChainEventKind::RunStarted { total_steps: 1, .. }
        ));
        assert!(matches!(
            events.last().unwrap().kind,
            ChainEventKind::RunFinished {
                completed: 1,
                total_steps: 1
            }
        ));
        assert!(events
            .iter()
            .any(|e| matches!(e.kind, ChainEventKind::TaskPolled { .. }) && e.step == Some(0)));
    }
}
