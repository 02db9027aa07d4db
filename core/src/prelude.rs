use crate::model::{AnalysisRequest, Detection, File, Job, LocalFile, Modality};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the remote analysis service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8001".into(),
            poll_interval_ms: 5_000,
            request_timeout_ms: 30_000,
        }
    }
}

impl ClientConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}

/// Common error type for every interaction with the remote service.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("remote rejected request ({status}): {reason}")]
    RemoteRejection { status: u16, reason: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("stale refresh discarded (issued at generation {issued}, now {current})")]
    StaleCommit { issued: u64, current: u64 },
}

impl ClientError {
    /// Stale commits are bookkeeping and never shown to the operator.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, ClientError::StaleCommit { .. })
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// REST surface of the remote analysis service.
///
/// `upload` and `create_job` are not idempotent and must never be retried by
/// an implementation; the listing calls and `delete_file` are safe to repeat.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn upload(&self, file: &LocalFile, modality: Modality) -> ClientResult<File>;
    async fn list_files(&self) -> ClientResult<Vec<File>>;
    async fn list_jobs(&self) -> ClientResult<Vec<Job>>;
    async fn list_detections(&self) -> ClientResult<Vec<Detection>>;
    async fn create_job(&self, request: &AnalysisRequest) -> ClientResult<Job>;
    async fn get_job(&self, job_id: &str) -> ClientResult<Job>;
    async fn delete_file(&self, file_id: &str) -> ClientResult<()>;
}
