use std::path::Path;

use async_trait::async_trait;
use reqwest::{
    StatusCode,
    multipart::{Form, Part},
};
use serde::Deserialize;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::{
    error::{ReelnoteError, Result},
    media::upload_content_type,
    types::{FolderId, Job, JobStatus, TaskId},
};

/// The external upload/transcode service.
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Submit a video for processing.
    async fn upload(&self, video: &Path) -> Result<TaskId>;

    /// Current state of a submitted job.
    async fn status(&self, task_id: &TaskId) -> Result<Job>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    task_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: Option<String>,
    #[serde(default)]
    progress: f64,
    folder_id: Option<String>,
    error: Option<String>,
}

/// `POST /upload` and `GET /status/{task_id}` over HTTP.
#[derive(Clone)]
pub struct HttpJobBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpJobBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl JobBackend for HttpJobBackend {
    async fn upload(&self, video: &Path) -> Result<TaskId> {
        let content_type = upload_content_type(video)?;
        let file_name = video
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());

        let file = fs::File::open(video).await?;
        let length = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let part = Part::stream_with_length(body, length)
            .file_name(file_name)
            .mime_str(content_type)?;

        let url = format!("{}/upload", self.base_url);
        info!(%url, bytes = length, "uploading video");

        let response = self
            .client
            .post(&url)
            .multipart(Form::new().part("file", part))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReelnoteError::BackendStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let body: UploadResponse = response.json().await?;
        match (body.task_id, body.error) {
            (Some(task_id), _) if !task_id.trim().is_empty() => Ok(TaskId(task_id)),
            (_, Some(reason)) => Err(ReelnoteError::UploadFailed { reason }),
            _ => Err(ReelnoteError::UploadFailed {
                reason: "backend response carried no task id".into(),
            }),
        }
    }

    async fn status(&self, task_id: &TaskId) -> Result<Job> {
        let url = format!("{}/status/{}", self.base_url, task_id);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(ReelnoteError::TaskNotFound {
                    task_id: task_id.to_string(),
                });
            }
            status if !status.is_success() => {
                return Err(ReelnoteError::BackendStatus {
                    url,
                    status: status.as_u16(),
                });
            }
            _ => {}
        }

        let body: StatusResponse = response.json().await?;
        debug!(%task_id, ?body, "status response");

        let Some(label) = body.status else {
            // The backend answers unknown ids with 200 and an `error` field.
            debug!(%task_id, error = ?body.error, "status response without status");
            return Err(ReelnoteError::TaskNotFound {
                task_id: task_id.to_string(),
            });
        };

        let status = JobStatus::from_label(&label);
        // A completed job stays completed even when its folder id is unusable.
        let folder_id = match body.folder_id {
            Some(raw) if status == JobStatus::Completed => match FolderId::parse(raw) {
                Ok(folder_id) => Some(folder_id),
                Err(err) => {
                    warn!(%task_id, error = %err, "completed job reported an invalid folder");
                    None
                }
            },
            _ => None,
        };
        if status == JobStatus::Completed && folder_id.is_none() {
            warn!(%task_id, "completed job has no result folder");
        }

        Ok(Job::new(task_id.clone(), status, body.progress).with_folder(folder_id))
    }
}
