//! Client for the remote video generation service.
//!
//! The service runs each generation as an asynchronous task: a task is
//! created with a prompt and an optional first frame, then its status is
//! queried until it finishes. Finished tasks expose the clip (and optionally
//! its last frame) as URLs that are downloaded separately.

pub mod client;
pub mod error;
pub mod gateway;
pub mod types;


pub use client::{ArkClient, ArkClientConfig, DEFAULT_BASE_URL};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{MediaDownloader, TaskGateway};
pub use types::{encode_image, ContentItem, CreateTaskRequest, TaskStatusResponse};
