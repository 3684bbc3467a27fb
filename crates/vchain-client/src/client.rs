//! Generation service HTTP client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Response};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use vchain_models::{GenerationRequest, TaskHandle, TaskStatus};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{MediaDownloader, TaskGateway};
use crate::types::{CreateTaskRequest, CreateTaskResponse, TaskStatusResponse};

pub const DEFAULT_BASE_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";

const TASKS_PATH: &str = "/contents/generations/tasks";

/// Configuration for the generation client.
#[derive(Clone)]
pub struct ArkClientConfig {
    /// Base URL of the service API
    pub base_url: String,
    /// Bearer token
    pub api_key: String,
    /// Timeout for task create/status calls
    pub request_timeout: Duration,
    /// Timeout for one media download
    pub download_timeout: Duration,
}

impl std::fmt::Debug for ArkClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArkClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("download_timeout", &self.download_timeout)
            .finish()
    }
}

impl Default for ArkClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            request_timeout: Duration::from_secs(60),
            download_timeout: Duration::from_secs(120),
        }
    }
}

impl ArkClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> GatewayResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GatewayResult<Self> {
        let api_key = lookup("ARK_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or(GatewayError::MissingApiKey)?;

        Ok(Self {
            base_url: lookup("ARK_API_BASE_URL")
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            request_timeout: timeout_var(&lookup, "ARK_REQUEST_TIMEOUT", 60)?,
            download_timeout: timeout_var(&lookup, "ARK_DOWNLOAD_TIMEOUT", 120)?,
        })
    }

    /// Point the client at another base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }
}

/// Whole seconds, strictly parsed; zero is rejected.
fn timeout_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> GatewayResult<Duration> {
    let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) else {
        return Ok(Duration::from_secs(default));
    };
    let invalid = |reason: String| GatewayError::InvalidConfig {
        var,
        value: value.clone(),
        reason,
    };
    match value.trim().parse::<u64>() {
        Ok(0) => Err(invalid("must be at least 1 second".to_string())),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Client for the generation service.
pub struct ArkClient {
    http: Client,
    download_http: Client,
    config: ArkClientConfig,
}

impl ArkClient {
    /// Create a new client.
    pub fn new(config: ArkClientConfig) -> GatewayResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GatewayError::MissingApiKey);
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(GatewayError::Network)?;
        let download_http = Client::builder()
            .timeout(config.download_timeout)
            .build()
            .map_err(GatewayError::Network)?;

        Ok(Self {
            http,
            download_http,
            config,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> GatewayResult<Self> {
        Self::new(ArkClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ArkClientConfig {
        &self.config
    }

    fn tasks_url(&self) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), TASKS_PATH)
    }

    /// Turn a non-2xx response into an error carrying its body.
    async fn check_status(response: Response) -> GatewayResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::from_http_status(status, body))
    }
}

#[async_trait]
impl TaskGateway for ArkClient {
    async fn create(&self, request: &GenerationRequest) -> GatewayResult<TaskHandle> {
        request.validate()?;
        let body = CreateTaskRequest::from_request(request).await?;

        info!(
            model = %body.model,
            duration = body.duration,
            ratio = %body.ratio,
            resolution = %body.resolution,
            generate_audio = request.generate_audio,
            "Creating generation task"
        );

        let response = self
            .http
            .post(self.tasks_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let created: CreateTaskResponse = serde_json::from_slice(&response.bytes().await?)?;
        let id = created
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GatewayError::invalid_response("create response has no task id"))?;

        info!(task_id = %id, "Task created");
        Ok(TaskHandle::from_string(id))
    }

    async fn status(&self, handle: &TaskHandle) -> GatewayResult<TaskStatus> {
        let url = format!("{}/{}", self.tasks_url(), handle);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let parsed: TaskStatusResponse = serde_json::from_slice(&response.bytes().await?)?;
        let status = parsed.into_status()?;
        debug!(task_id = %handle, status = %status, "Task status");
        Ok(status)
    }
}

/// `<dest>.part`, the in-progress download path.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

#[async_trait]
impl MediaDownloader for ArkClient {
    async fn download(&self, url: &str, dest: &Path) -> GatewayResult<u64> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        debug!("Downloading {} to {}", url, dest.display());
        let response = self.download_http.get(url).send().await?;
        let response = Self::check_status(response).await?;

        let part = partial_path(dest);
        let result = async {
            let mut file = tokio::fs::File::create(&part).await?;
            let mut stream = response.bytes_stream();
            let mut written: u64 = 0;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok::<_, GatewayError>(written)
        }
        .await;

        let written = match result {
            Ok(written) => written,
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&part).await {
                    warn!("Failed to remove partial download {}: {}", part.display(), rm);
                }
                return Err(e);
            }
        };

        tokio::fs::rename(&part, dest).await?;
        info!(
            "Downloaded {} ({:.2} MB)",
            dest.display(),
            written as f64 / (1024.0 * 1024.0)
        );
        Ok(written)
    }
}
