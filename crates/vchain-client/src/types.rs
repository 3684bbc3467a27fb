//! Generation service request/response types.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use vchain_models::{image_mime_type, GenerationRequest, ImageSource, TaskOutput, TaskStatus};

use crate::error::{GatewayError, GatewayResult};

/// One entry of the `content` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Body of `POST /contents/generations/tasks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub model: String,
    pub content: Vec<ContentItem>,
    pub duration: u32,
    pub ratio: String,
    pub resolution: String,
    /// Only sent when enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_audio: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    pub camera_fixed: bool,
    pub watermark: bool,
    /// Only sent when enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_last_frame: Option<bool>,
}

impl CreateTaskRequest {
    /// Build the wire body, inlining a local first frame as a data URI.
    pub async fn from_request(request: &GenerationRequest) -> GatewayResult<Self> {
        let mut content = vec![ContentItem::Text {
            text: request.prompt.clone(),
        }];
        if let Some(image) = &request.input_image {
            content.push(ContentItem::ImageUrl {
                image_url: ImageUrl {
                    url: encode_image(image).await?,
                },
            });
        }

        Ok(Self {
            model: request.model.clone(),
            content,
            duration: request.duration_secs,
            ratio: request.ratio.as_str().to_string(),
            resolution: request.resolution.as_str().to_string(),
            generate_audio: request.generate_audio.then_some(true),
            seed: request.seed,
            camera_fixed: request.camera_fixed,
            watermark: request.watermark,
            return_last_frame: request.return_last_frame.then_some(true),
        })
    }
}

/// Resolve an image reference to the URL string the service accepts.
///
/// Local files become `data:<mime>;base64,...` URIs.
pub async fn encode_image(image: &ImageSource) -> GatewayResult<String> {
    match image {
        ImageSource::Url(url) => Ok(url.clone()),
        ImageSource::DataUri(uri) => Ok(uri.clone()),
        ImageSource::LocalPath(path) => {
            let mime = image_mime_type(path)?;
            let bytes = tokio::fs::read(path).await.map_err(|e| {
                GatewayError::invalid_request(format!(
                    "cannot read image {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
        }
    }
}

/// Response of `POST /contents/generations/tasks`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskResponse {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskContent {
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub last_frame_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `GET /contents/generations/tasks/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub content: Option<TaskContent>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<TaskErrorBody>,
}

impl TaskStatusResponse {
    fn failure_message(&self) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| {
                self.error
                    .as_ref()
                    .and_then(|e| e.message.as_deref())
                    .filter(|m| !m.trim().is_empty())
            })
            .unwrap_or("unknown error")
            .to_string()
    }

    /// Convert into the service-independent status.
    pub fn into_status(self) -> GatewayResult<TaskStatus> {
        match self.status.as_str() {
            "queued" => Ok(TaskStatus::Queued),
            "running" => Ok(TaskStatus::Running),
            "succeeded" => {
                let content = self.content.unwrap_or_default();
                let video_url = content
                    .video_url
                    .filter(|u| !u.is_empty())
                    .ok_or_else(|| {
                        GatewayError::invalid_response("succeeded task has no video_url")
                    })?;
                Ok(TaskStatus::Succeeded(TaskOutput {
                    video_url,
                    last_frame_url: content.last_frame_url.filter(|u| !u.is_empty()),
                }))
            }
            "failed" | "expired" | "cancelled" => Ok(TaskStatus::Failed {
                message: self.failure_message(),
            }),
            other => Ok(TaskStatus::Unknown {
                raw: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vchain_models::GenerationParams;

    fn status(json: &str) -> GatewayResult<TaskStatus> {
        serde_json::from_str::<TaskStatusResponse>(json)
            .unwrap()
            .into_status()
    }

    #[tokio::test]
    async fn test_optional_fields_omitted() {
        let params = GenerationParams {
            generate_audio: false,
            ..Default::default()
        };
        let request = GenerationRequest::new("a fox runs", None, &params);
        let body = serde_json::to_value(CreateTaskRequest::from_request(&request).await.unwrap())
            .unwrap();

        assert!(body.get("generate_audio").is_none());
        assert!(body.get("seed").is_none());
        assert!(body.get("return_last_frame").is_none());
        assert_eq!(body["content"][0]["type"], "text");
        assert_eq!(body["content"].as_array().unwrap().len(), 1);
        assert_eq!(body["ratio"], "adaptive");
    }

    #[tokio::test]
    async fn test_image_and_flags_serialized() {
        let params = GenerationParams {
            seed: Some(42),
            ..Default::default()
        };
        let request = GenerationRequest::new(
            "a fox runs",
            Some(ImageSource::Url("https://cdn/f.jpg".into())),
            &params,
        )
        .with_last_frame();
        let body = serde_json::to_value(CreateTaskRequest::from_request(&request).await.unwrap())
            .unwrap();

        assert_eq!(body["content"][1]["type"], "image_url");
        assert_eq!(body["content"][1]["image_url"]["url"], "https://cdn/f.jpg");
        assert_eq!(body["generate_audio"], true);
        assert_eq!(body["return_last_frame"], true);
        assert_eq!(body["seed"], 42);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status(r#"{"status":"queued"}"#).unwrap(), TaskStatus::Queued);
        assert_eq!(
            status(r#"{"status":"succeeded","content":{"video_url":"https://v","last_frame_url":"https://f"}}"#)
                .unwrap(),
            TaskStatus::Succeeded(TaskOutput {
                video_url: "https://v".into(),
                last_frame_url: Some("https://f".into()),
            })
        );
        assert_eq!(
            status(r#"{"status":"paused"}"#).unwrap(),
            TaskStatus::Unknown {
                raw: "paused".into()
            }
        );
    }

    #[test]
    fn test_failure_message_fallbacks() {
        assert_eq!(
            status(r#"{"status":"failed","message":"content policy"}"#).unwrap(),
            TaskStatus::Failed {
                message: "content policy".into()
            }
        );
        assert_eq!(
            status(r#"{"status":"expired","error":{"code":"Timeout","message":"task expired"}}"#)
                .unwrap(),
            TaskStatus::Failed {
                message: "task expired".into()
            }
        );
        assert_eq!(
            status(r#"{"status":"cancelled"}"#).unwrap(),
            TaskStatus::Failed {
                message: "unknown error".into()
            }
        );
    }

    #[test]
    fn test_succeeded_without_video_is_malformed() {
        assert!(matches!(
            status(r#"{"status":"succeeded","content":{}}"#),
            Err(GatewayError::InvalidResponse(_))
        ));
    }
}
