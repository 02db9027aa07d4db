use crate::model::{AnalysisRequest, Detection, File, Job, LocalFile, Modality};
use crate::prelude::{AnalysisService, ClientConfig, ClientError, ClientResult};
use crate::telemetry::LogManager;
use async_trait::async_trait;
use reqwest::{multipart, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// reqwest client for the `/api` REST surface of the analysis service.
///
/// Requests are sent exactly once; retries are left to the operator.
pub struct HttpAnalysisService {
    client: reqwest::Client,
    base_url: String,
    logger: LogManager,
}

/// FastAPI-style error body; `detail` is a string or a validation list.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HttpAnalysisService {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(network)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            logger: LogManager::new("http"),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.endpoint(path);
        self.logger.debug(&format!("GET {url}"));
        let response = self.client.get(url).send().await.map_err(network)?;
        decode(response).await
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn upload(&self, file: &LocalFile, modality: Modality) -> ClientResult<File> {
        let metadata = serde_json::to_string(&file.metadata())
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
        let form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(file.bytes.clone()).file_name(file.name.clone()),
            )
            .text("file_type", modality.as_str())
            .text("metadata", metadata);

        self.logger
            .debug(&format!("POST upload {} as {modality}", file.name));
        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }

    async fn list_files(&self) -> ClientResult<Vec<File>> {
        self.get_json("files").await
    }

    async fn list_jobs(&self) -> ClientResult<Vec<Job>> {
        self.get_json("jobs").await
    }

    async fn list_detections(&self) -> ClientResult<Vec<Detection>> {
        self.get_json("detections").await
    }

    async fn create_job(&self, request: &AnalysisRequest) -> ClientResult<Job> {
        let response = self
            .client
            .post(self.endpoint("analyze"))
            .json(request)
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }

    async fn get_job(&self, job_id: &str) -> ClientResult<Job> {
        self.get_json(&format!("jobs/{job_id}")).await
    }

    async fn delete_file(&self, file_id: &str) -> ClientResult<()> {
        let response = self
            .client
            .delete(self.endpoint(&format!("files/{file_id}")))
            .send()
            .await
            .map_err(network)?;
        check_status(response).await.map(|_| ())
    }
}

fn network(err: reqwest::Error) -> ClientError {
    ClientError::Network(err.to_string())
}

async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::RemoteRejection {
        status: status.as_u16(),
        reason: rejection_reason(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string()),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let response = check_status(response).await?;
    let status = response.status().as_u16();
    let body = response.bytes().await.map_err(network)?;
    serde_json::from_slice(&body).map_err(|e| ClientError::RemoteRejection {
        status,
        reason: format!("malformed payload: {e}"),
    })
}

fn rejection_reason(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => Some(detail),
        Ok(ErrorBody { detail }) => Some(detail.to_string()),
        Err(_) => Some(body.trim().to_string()),
    }
}
