use chrono::Utc;
use mstrcore::model::{
    AnalysisRequest, Detection, File, FileMetadata, Job, JobStatus, Modality,
};
use std::sync::{Arc, RwLock};

pub type SharedStore = Arc<RwLock<ServiceStore>>;

/// In-memory records the service would otherwise keep in its database.
#[derive(Debug, Default)]
pub struct ServiceStore {
    files: Vec<File>,
    jobs: Vec<Job>,
    detections: Vec<Detection>,
}

impl ServiceStore {
    pub fn shared() -> SharedStore {
        Arc::new(RwLock::new(Self::default()))
    }

    pub fn add_file(
        &mut self,
        filename: String,
        file_type: Modality,
        metadata: Option<FileMetadata>,
    ) -> File {
        let file = File {
            id: uuid::Uuid::new_v4().to_string(),
            filename,
            file_type,
            uploaded_at: Utc::now(),
            metadata,
        };
        self.files.push(file.clone());
        file
    }

    pub fn files(&self) -> Vec<File> {
        self.files.clone()
    }

    pub fn has_file(&self, file_id: &str) -> bool {
        self.files.iter().any(|file| file.id == file_id)
    }

    /// Newest first.
    pub fn jobs(&self) -> Vec<Job> {
        let mut jobs = self.jobs.clone();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    pub fn job(&self, job_id: &str) -> Option<Job> {
        self.jobs.iter().find(|job| job.id == job_id).cloned()
    }

    /// Newest first; untimestamped detections sort last.
    pub fn detections(&self, file_id: Option<&str>) -> Vec<Detection> {
        let mut detections: Vec<Detection> = self
            .detections
            .iter()
            .filter(|detection| file_id.map_or(true, |id| detection.file_id.as_deref() == Some(id)))
            .cloned()
            .collect();
        detections.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        detections
    }

    pub fn create_job(&mut self, request: AnalysisRequest) -> Job {
        let job = Job {
            id: uuid::Uuid::new_v4().to_string(),
            file_ids: request.file_ids,
            analysis_type: request.analysis_type,
            status: JobStatus::Processing,
            created_at: Utc::now(),
            completed_at: None,
            results: None,
        };
        self.jobs.push(job.clone());
        job
    }

    pub fn complete_job(&mut self, job_id: &str, results: Vec<Detection>) -> bool {
        let Some(job) = self.jobs.iter_mut().find(|job| job.id == job_id) else {
            return false;
        };
        job.status = JobStatus::Completed;
        job.completed_at = Some(Utc::now());
        job.results = Some(results.clone());
        self.detections.extend(results);
        true
    }

    pub fn fail_job(&mut self, job_id: &str) -> bool {
        let Some(job) = self.jobs.iter_mut().find(|job| job.id == job_id) else {
            return false;
        };
        job.status = JobStatus::Failed;
        job.completed_at = Some(Utc::now());
        true
    }

    /// Removes the file and every detection recorded against it.
    pub fn delete_file(&mut self, file_id: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|file| file.id != file_id);
        if self.files.len() == before {
            return false;
        }
        self.detections
            .retain(|detection| detection.file_id.as_deref() != Some(file_id));
        true
    }
}
