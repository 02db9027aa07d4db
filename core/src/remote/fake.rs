//! In-memory `AnalysisService` with call counters and failure injection.

use crate::model::{
    AnalysisRequest, BoundingBox, Detection, File, Job, JobStatus, LocalFile, Modality,
};
use crate::prelude::{AnalysisService, ClientError, ClientResult};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Endpoint {
    Upload,
    Files,
    Jobs,
    Detections,
    Analyze,
    GetJob,
    Delete,
}

#[derive(Default)]
struct FakeState {
    files: Vec<File>,
    jobs: Vec<Job>,
    detections: Vec<Detection>,
    calls: HashMap<Endpoint, usize>,
    failing: HashSet<Endpoint>,
    rejected_uploads: HashSet<String>,
    upload_events: Vec<String>,
    detections_gate: Option<Arc<Notify>>,
}

#[derive(Default)]
pub(crate) struct FakeService {
    state: Mutex<FakeState>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_file(&self, id: &str, filename: &str) {
        let mut state = self.state.lock().unwrap();
        state.files.push(File {
            id: id.into(),
            filename: filename.into(),
            file_type: crate::ingest::classify_modality(filename),
            uploaded_at: Utc::now(),
            metadata: None,
        });
    }

    pub fn seed_detection(&self, target_type: &str, confidence: f64) {
        let mut state = self.state.lock().unwrap();
        state.detections.push(Detection::new(
            target_type,
            confidence,
            BoundingBox::new(0.5, 0.5),
        ));
    }

    pub fn fail(&self, endpoint: Endpoint) {
        self.state.lock().unwrap().failing.insert(endpoint);
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.state.lock().unwrap().failing.remove(&endpoint);
    }

    pub fn reject_upload(&self, filename: &str) {
        self.state
            .lock()
            .unwrap()
            .rejected_uploads
            .insert(filename.into());
    }

    /// Holds the next `list_detections` call until the returned gate is notified.
    pub fn gate_detections(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().unwrap().detections_gate = Some(gate.clone());
        gate
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(&endpoint)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.values().sum()
    }

    pub fn upload_events(&self) -> Vec<String> {
        self.state.lock().unwrap().upload_events.clone()
    }

    fn enter(&self, endpoint: Endpoint) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(endpoint).or_default() += 1;
        if !state.failing.contains(&endpoint) {
            return Ok(());
        }
        match endpoint {
            Endpoint::Upload | Endpoint::Analyze => Err(ClientError::RemoteRejection {
                status: 500,
                reason: "simulated failure".into(),
            }),
            _ => Err(ClientError::Network("connection reset".into())),
        }
    }
}

#[async_trait]
impl AnalysisService for FakeService {
    async fn upload(&self, file: &LocalFile, modality: Modality) -> ClientResult<File> {
        self.enter(Endpoint::Upload)?;
        self.state
            .lock()
            .unwrap()
            .upload_events
            .push(format!("start:{}", file.name));
        tokio::task::yield_now().await;

        let mut state = self.state.lock().unwrap();
        state.upload_events.push(format!("end:{}", file.name));
        if state.rejected_uploads.contains(&file.name) {
            return Err(ClientError::RemoteRejection {
                status: 422,
                reason: format!("unsupported payload {}", file.name),
            });
        }
        let record = File {
            id: format!("file-{}", state.files.len() + 1),
            filename: file.name.clone(),
            file_type: modality,
            uploaded_at: Utc::now(),
            metadata: Some(file.metadata()),
        };
        state.files.push(record.clone());
        Ok(record)
    }

    async fn list_files(&self) -> ClientResult<Vec<File>> {
        self.enter(Endpoint::Files)?;
        Ok(self.state.lock().unwrap().files.clone())
    }

    async fn list_jobs(&self) -> ClientResult<Vec<Job>> {
        self.enter(Endpoint::Jobs)?;
        Ok(self.state.lock().unwrap().jobs.clone())
    }

    async fn list_detections(&self) -> ClientResult<Vec<Detection>> {
        self.enter(Endpoint::Detections)?;
        let gate = self.state.lock().unwrap().detections_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.state.lock().unwrap().detections.clone())
    }

    async fn create_job(&self, request: &AnalysisRequest) -> ClientResult<Job> {
        self.enter(Endpoint::Analyze)?;
        let mut state = self.state.lock().unwrap();
        let job = Job {
            id: format!("job-{}", state.jobs.len() + 1),
            file_ids: request.file_ids.clone(),
            analysis_type: request.analysis_type,
            status: JobStatus::Processing,
            created_at: Utc::now(),
            completed_at: None,
            results: None,
        };
        state.jobs.push(job.clone());
        Ok(job)
    }

    async fn get_job(&self, job_id: &str) -> ClientResult<Job> {
        self.enter(Endpoint::GetJob)?;
        self.state
            .lock()
            .unwrap()
            .jobs
            .iter()
            .find(|job| job.id == job_id)
            .cloned()
            .ok_or_else(|| ClientError::RemoteRejection {
                status: 404,
                reason: "Job not found".into(),
            })
    }

    async fn delete_file(&self, file_id: &str) -> ClientResult<()> {
        self.enter(Endpoint::Delete)?;
        let mut state = self.state.lock().unwrap();
        let before = state.files.len();
        state.files.retain(|file| file.id != file_id);
        if state.files.len() == before {
            return Err(ClientError::RemoteRejection {
                status: 404,
                reason: "File not found".into(),
            });
        }
        Ok(())
    }
}
