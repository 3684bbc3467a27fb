//! In-memory collaborators for orchestrator and poller tests.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use vchain_client::{GatewayError, GatewayResult, MediaDownloader, TaskGateway};
use vchain_media::{FfmpegCommand, MediaError, MediaResult, MediaTool};
use vchain_models::{GenerationRequest, TaskHandle, TaskOutput, TaskStatus};

/// What `create` does for the next task.
enum Script {
    Statuses(Vec<TaskStatus>),
    Reject(u16, String),
}

#[derive(Default)]
struct GatewayState {
    next_id: usize,
    scripts: VecDeque<Script>,
    tasks: HashMap<TaskHandle, VecDeque<TaskStatus>>,
    status_calls: HashMap<TaskHandle, usize>,
    requests: Vec<GenerationRequest>,
    status_error: Option<GatewayError>,
}

/// Gateway whose tasks follow scripted status sequences.
///
/// The last status of a sequence repeats forever. Tasks created without a
/// script succeed immediately with a service-provided last frame.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    state: Mutex<GatewayState>,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn succeeded(video_url: &str, last_frame_url: Option<&str>) -> TaskStatus {
        TaskStatus::Succeeded(TaskOutput {
            video_url: video_url.to_string(),
            last_frame_url: last_frame_url.map(String::from),
        })
    }

    /// Register a task directly, bypassing `create`.
    pub fn add_task(&self, statuses: Vec<TaskStatus>) -> TaskHandle {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let handle = TaskHandle::from_string(format!("task-{}", state.next_id));
        state.tasks.insert(handle.clone(), statuses.into());
        handle
    }

    /// Script the statuses of the next created task.
    pub fn script(&self, statuses: Vec<TaskStatus>) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .push_back(Script::Statuses(statuses));
    }

    /// Make the next `create` fail with an HTTP status.
    pub fn reject_next(&self, status: u16, body: &str) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .push_back(Script::Reject(status, body.to_string()));
    }

    /// Make the next `status` call fail.
    pub fn fail_status(&self, err: GatewayError) {
        self.state.lock().unwrap().status_error = Some(err);
    }

    pub fn status_calls(&self, handle: &TaskHandle) -> usize {
        self.state
            .lock()
            .unwrap()
            .status_calls
            .get(handle)
            .copied()
            .unwrap_or(0)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl TaskGateway for ScriptedGateway {
    async fn create(&self, request: &GenerationRequest) -> GatewayResult<TaskHandle> {
        request.validate()?;
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());

        let script = state.scripts.pop_front();
        state.next_id += 1;
        let id = format!("task-{}", state.next_id);
        let statuses = match script {
            Some(Script::Reject(status, body)) => {
                return Err(GatewayError::from_http_status(status, body))
            }
            Some(Script::Statuses(statuses)) => statuses,
            None => {
                let frame = format!("https://cdn.test/{}_last.jpg", id);
                vec![Self::succeeded(
                    &format!("https://cdn.test/{}.mp4", id),
                    Some(frame.as_str()),
                )]
            }
        };

        let handle = TaskHandle::from_string(id);
        state.tasks.insert(handle.clone(), statuses.into());
        Ok(handle)
    }

    async fn status(&self, handle: &TaskHandle) -> GatewayResult<TaskStatus> {
        let mut state = self.state.lock().unwrap();
        *state.status_calls.entry(handle.clone()).or_default() += 1;

        if let Some(err) = state.status_error.take() {
            return Err(err);
        }

        let queue = state
            .tasks
            .get_mut(handle)
            .ok_or_else(|| GatewayError::from_http_status(404, "task not found"))?;
        let status = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        status.ok_or_else(|| GatewayError::invalid_response("empty script"))
    }
}

#[derive(Default)]
struct DownloaderState {
    downloads: Vec<(String, PathBuf)>,
    failures: VecDeque<u16>,
}

/// Writes a small placeholder file for every download.
#[derive(Default)]
pub(crate) struct RecordingDownloader {
    state: Mutex<DownloaderState>,
}

impl RecordingDownloader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the next attempt with an HTTP status.
    pub fn fail_next(&self, status: u16) {
        self.state.lock().unwrap().failures.push_back(status);
    }

    /// Every attempt, including failed ones.
    pub fn downloads(&self) -> Vec<(String, PathBuf)> {
        self.state.lock().unwrap().downloads.clone()
    }
}

#[async_trait]
impl MediaDownloader for RecordingDownloader {
    async fn download(&self, url: &str, dest: &Path) -> GatewayResult<u64> {
        let failure = {
            let mut state = self.state.lock().unwrap();
            state.downloads.push((url.to_string(), dest.to_path_buf()));
            state.failures.pop_front()
        };
        if let Some(status) = failure {
            return Err(GatewayError::from_http_status(status, "scripted failure"));
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = format!("clip from {}", url);
        std::fs::write(dest, &body)?;
        Ok(body.len() as u64)
    }
}

/// One recorded FFmpeg invocation.
#[derive(Debug, Clone)]
pub(crate) struct ToolCall {
    pub input: PathBuf,
    pub output: PathBuf,
    pub args: Vec<String>,
    /// Manifest contents, for concat invocations
    pub manifest: Option<String>,
}

impl ToolCall {
    pub fn is_concat(&self) -> bool {
        self.args.iter().any(|a| a == "concat")
    }
}

#[derive(Default)]
struct ToolState {
    calls: Vec<ToolCall>,
    fail_frames: bool,
    fail_concat: bool,
    missing: bool,
}

/// FFmpeg stand-in that writes its output file without running anything.
#[derive(Default)]
pub(crate) struct ScriptedTool {
    state: Mutex<ToolState>,
}

impl ScriptedTool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_frames(&self) {
        self.state.lock().unwrap().fail_frames = true;
    }

    pub fn fail_concat(&self) {
        self.state.lock().unwrap().fail_concat = true;
    }

    /// Behave as if FFmpeg were not installed.
    pub fn missing(&self) {
        self.state.lock().unwrap().missing = true;
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn frame_calls(&self) -> Vec<ToolCall> {
        self.calls().into_iter().filter(|c| !c.is_concat()).collect()
    }

    pub fn concat_calls(&self) -> Vec<ToolCall> {
        self.calls().into_iter().filter(|c| c.is_concat()).collect()
    }
}

#[async_trait]
impl MediaTool for ScriptedTool {
    async fn run(&self, cmd: &FfmpegCommand, _timeout: Duration) -> MediaResult<()> {
        let args = cmd.build_args();
        let is_concat = args.iter().any(|a| a == "concat");
        let manifest = if is_concat {
            std::fs::read_to_string(cmd.input()).ok()
        } else {
            None
        };

        let mut state = self.state.lock().unwrap();
        state.calls.push(ToolCall {
            input: cmd.input().to_path_buf(),
            output: cmd.output().to_path_buf(),
            args,
            manifest,
        });

        if state.missing {
            return Err(MediaError::FfmpegNotFound);
        }
        if (is_concat && state.fail_concat) || (!is_concat && state.fail_frames) {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some("Invalid data found when processing input".into()),
                Some(1),
            ));
        }

        std::fs::write(cmd.output(), b"ffmpeg output")?;
        Ok(())
    }
}
